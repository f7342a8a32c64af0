//! 审计日志服务

use crate::{error::AppError, models::audit::AuditLog, repository::audit_repo::AuditRepository};
use sqlx::PgPool;
use uuid::Uuid;

/// 审计操作类型
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    UserLogin,
    PermissionDenied,

    ProjectCreate,
    ProjectArchive,

    RoleCreate,
    RoleDelete,
    RoleAssign,
    RoleUnassign,
    GrantUpdate,
    FieldUpdate,

    NetworkCreate,
    HostCreate,
    ServiceCreate,
    IssueCreate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserLogin => "user.login",
            AuditAction::PermissionDenied => "permission.denied",

            AuditAction::ProjectCreate => "project.create",
            AuditAction::ProjectArchive => "project.archive",

            AuditAction::RoleCreate => "role.create",
            AuditAction::RoleDelete => "role.delete",
            AuditAction::RoleAssign => "role.assign",
            AuditAction::RoleUnassign => "role.unassign",
            AuditAction::GrantUpdate => "grant.update",
            AuditAction::FieldUpdate => "field.update",

            AuditAction::NetworkCreate => "network.create",
            AuditAction::HostCreate => "host.create",
            AuditAction::ServiceCreate => "service.create",
            AuditAction::IssueCreate => "issue.create",
        }
    }
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 记录一条审计日志
    pub async fn log(
        &self,
        user_id: Option<Uuid>,
        action: AuditAction,
        object_class: &str,
        object_id: Option<Uuid>,
        project_id: Option<Uuid>,
        detail: Option<&str>,
    ) -> Result<(), AppError> {
        let log = AuditLog {
            id: Uuid::new_v4(),
            user_id,
            action: action.as_str().to_string(),
            object_class: object_class.to_string(),
            object_id,
            project_id,
            detail: detail.map(|s| s.to_string()),
            occurred_at: chrono::Utc::now(),
        };

        let repo = AuditRepository::new(self.db.clone());
        repo.insert(&log).await?;

        Ok(())
    }

    /// 查询最近的日志
    pub async fn recent(
        &self,
        project_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.recent(project_id, limit).await
    }
}
