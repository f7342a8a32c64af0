//! Project repository (项目与自定义字段数据访问)

use crate::{error::AppError, models::project::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ProjectRepository {
    db: PgPool,
}

impl ProjectRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }

    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        leader_id: Uuid,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, description, leader_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(leader_id)
        .fetch_one(&self.db)
        .await?;

        Ok(project)
    }

    pub async fn set_archived(&self, id: Uuid, archived: bool) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE projects SET is_archived = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(archived)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Custom fields ====================

    /// 创建自定义字段定义
    pub async fn create_field_def(
        &self,
        req: &CreateProjectFieldRequest,
    ) -> Result<ProjectFieldDef, AppError> {
        let def = sqlx::query_as::<_, ProjectFieldDef>(
            r#"
            INSERT INTO project_field_defs (title, field_kind)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.field_kind)
        .fetch_one(&self.db)
        .await?;

        Ok(def)
    }

    pub async fn list_field_defs(&self) -> Result<Vec<ProjectFieldDef>, AppError> {
        let defs = sqlx::query_as::<_, ProjectFieldDef>(
            "SELECT * FROM project_field_defs ORDER BY created_at",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(defs)
    }

    /// 惰性补齐项目缺失的字段值行。并发请求同时补齐时只会落一行。
    pub async fn ensure_field_values(&self, project_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO project_field_values (project_id, field_id)
            SELECT $1, d.id FROM project_field_defs d
            ON CONFLICT (project_id, field_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 项目的字段值行，连同定义，按定义创建顺序
    pub async fn list_field_values(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<(ProjectFieldValue, ProjectFieldDef)>, AppError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            project_id: Uuid,
            field_id: Uuid,
            value: Option<String>,
            def_title: String,
            def_kind: String,
            def_created_at: chrono::DateTime<chrono::Utc>,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT v.id, v.project_id, v.field_id, v.value,
                   d.title AS def_title, d.field_kind AS def_kind, d.created_at AS def_created_at
            FROM project_field_values v
            JOIN project_field_defs d ON d.id = v.field_id
            WHERE v.project_id = $1
            ORDER BY d.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    ProjectFieldValue {
                        id: r.id,
                        project_id: r.project_id,
                        field_id: r.field_id,
                        value: r.value,
                    },
                    ProjectFieldDef {
                        id: r.field_id,
                        title: r.def_title,
                        field_kind: r.def_kind,
                        created_at: r.def_created_at,
                    },
                )
            })
            .collect())
    }

    /// 字段值行连同定义
    pub async fn find_field_value(
        &self,
        value_id: Uuid,
    ) -> Result<Option<(ProjectFieldValue, ProjectFieldDef)>, AppError> {
        let value = sqlx::query_as::<_, ProjectFieldValue>(
            "SELECT * FROM project_field_values WHERE id = $1",
        )
        .bind(value_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(value) = value else {
            return Ok(None);
        };

        let def = sqlx::query_as::<_, ProjectFieldDef>(
            "SELECT * FROM project_field_defs WHERE id = $1",
        )
        .bind(value.field_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(Some((value, def)))
    }

    /// 更新字段值。行已消失时影响 0 行。
    pub async fn set_field_value(
        &self,
        value_id: Uuid,
        value: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE project_field_values SET value = $2 WHERE id = $1")
            .bind(value_id)
            .bind(value)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
