//! Audit repository (审计日志数据访问)

use crate::{error::AppError, models::audit::AuditLog};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AuditRepository {
    db: PgPool,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn insert(&self, log: &AuditLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, object_class, object_id, project_id, detail, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.user_id)
        .bind(&log.action)
        .bind(&log.object_class)
        .bind(log.object_id)
        .bind(log.project_id)
        .bind(&log.detail)
        .bind(log.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 最近的日志，可按项目过滤
    pub async fn recent(
        &self,
        project_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE $1::uuid IS NULL OR project_id = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}
