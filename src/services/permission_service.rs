//! 权限检查服务
//!
//! 项目范围的判定顺序: 动作必须在实体的动作集合中注册（否则是程序
//! 错误，直接 500），然后管理员职位或项目负责人无条件放行，最后对
//! 用户的有效角色按授权记录做 OR 合并。没有任何指派的用户以匿名
//! 角色参与判定，而不是直接拒绝。

use crate::{
    error::AppError,
    models::{
        project::Project,
        role::ANONYMOUS_ROLE_SLUG,
        user::UserWithPosition,
    },
    repository::{
        project_repo::ProjectRepository, role_repo::RoleRepository, user_repo::UserRepository,
    },
    schema::EntitySchema,
    services::audit_service::{AuditAction, AuditService},
};
use sqlx::PgPool;
use uuid::Uuid;

/// 纯合并逻辑: 越权身份无条件通过，否则任一有效角色持有肯定授权即通过
pub fn decide(overriding: bool, effective_role_ids: &[Uuid], granted_role_ids: &[Uuid]) -> bool {
    if overriding {
        return true;
    }
    effective_role_ids.iter().any(|id| granted_role_ids.contains(id))
}

pub struct PermissionService {
    db: PgPool,
}

impl PermissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 项目范围的权限检查
    pub async fn can_on_project(
        &self,
        user_id: Uuid,
        schema: &'static EntitySchema,
        action: &str,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        // 未注册的动作是调用方代码错误，绝不能当成静默拒绝
        if !schema.has_project_action(action) {
            return Err(AppError::UnregisteredAction {
                entity: schema.entity.to_string(),
                action: action.to_string(),
            });
        }

        let user = self.load_user(user_id).await?;
        let project = self.load_project(project_id).await?;

        let overriding = user.is_administrator || project.leader_id == user.id;

        let role_repo = RoleRepository::new(self.db.clone());
        let mut effective = role_repo.assigned_role_ids(user.id, project.id).await?;
        if effective.is_empty() {
            effective.push(self.anonymous_role_id(&role_repo).await?);
        }

        let granted = role_repo
            .granted_role_ids(schema.entity, action, &effective)
            .await?;

        Ok(decide(overriding, &effective, &granted))
    }

    /// 项目范围的权限检查，拒绝时记录并返回 403
    pub async fn require_on_project(
        &self,
        user_id: Uuid,
        schema: &'static EntitySchema,
        action: &str,
        project_id: Uuid,
        object_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let allowed = self.can_on_project(user_id, schema, action, project_id).await?;

        if !allowed {
            tracing::warn!(
                user_id = %user_id,
                entity = %schema.entity,
                action = %action,
                object_id = %object_id.map(|id| id.to_string()).unwrap_or_else(|| "None".to_string()),
                project_id = %project_id,
                "Permission denied"
            );
            let audit = AuditService::new(self.db.clone());
            audit
                .log(
                    Some(user_id),
                    AuditAction::PermissionDenied,
                    schema.entity,
                    object_id,
                    Some(project_id),
                    Some(action),
                )
                .await?;
            return Err(AppError::Forbidden);
        }

        Ok(())
    }

    /// 全局（职位）范围的权限检查。object_id 用于"用户可编辑自己"的特例。
    pub async fn can_globally(
        &self,
        user_id: Uuid,
        schema: &'static EntitySchema,
        action: &str,
        object_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        if !schema.has_global_action(action) {
            return Err(AppError::UnregisteredAction {
                entity: schema.entity.to_string(),
                action: action.to_string(),
            });
        }

        let user = self.load_user(user_id).await?;

        if user.is_administrator {
            return Ok(true);
        }

        // 用户始终可以编辑自己的账户
        if schema.entity == "User" && action == "edit" && object_id == Some(user.id) {
            return Ok(true);
        }

        let Some(position_id) = user.position_id else {
            return Ok(false);
        };

        let role_repo = RoleRepository::new(self.db.clone());
        role_repo
            .position_has_grant(position_id, schema.entity, action)
            .await
    }

    /// 全局范围的权限检查，拒绝时记录并返回 403
    pub async fn require_globally(
        &self,
        user_id: Uuid,
        schema: &'static EntitySchema,
        action: &str,
        object_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let allowed = self.can_globally(user_id, schema, action, object_id).await?;

        if !allowed {
            tracing::warn!(
                user_id = %user_id,
                entity = %schema.entity,
                action = %action,
                object_id = %object_id.map(|id| id.to_string()).unwrap_or_else(|| "None".to_string()),
                "Permission denied"
            );
            let audit = AuditService::new(self.db.clone());
            audit
                .log(
                    Some(user_id),
                    AuditAction::PermissionDenied,
                    schema.entity,
                    object_id,
                    None,
                    Some(action),
                )
                .await?;
            return Err(AppError::Forbidden);
        }

        Ok(())
    }

    /// 管理后台入口: 只有管理员职位可以通过
    pub async fn require_administrator(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self.load_user(user_id).await?;
        if !user.is_administrator {
            tracing::warn!(user_id = %user_id, "Administrator access denied");
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> Result<UserWithPosition, AppError> {
        let user_repo = UserRepository::new(self.db.clone());
        user_repo
            .find_with_position(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    async fn load_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        let project_repo = ProjectRepository::new(self.db.clone());
        project_repo
            .find_by_id(project_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 匿名角色是种子数据，缺失说明数据库没有正确初始化
    async fn anonymous_role_id(&self, role_repo: &RoleRepository) -> Result<Uuid, AppError> {
        role_repo
            .find_by_slug(ANONYMOUS_ROLE_SLUG)
            .await?
            .map(|role| role.id)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "The '{ANONYMOUS_ROLE_SLUG}' role is missing from the database"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_always_allows() {
        // 没有任何授权记录也放行
        assert!(decide(true, &[], &[]));
        assert!(decide(true, &[Uuid::new_v4()], &[]));
    }

    #[test]
    fn test_any_granted_role_allows() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        // b 持有授权即够，a 没有不影响
        assert!(decide(false, &[a, b], &[b, c]));
    }

    #[test]
    fn test_no_granted_role_denies() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(!decide(false, &[a], &[b]));
        assert!(!decide(false, &[a], &[]));
        assert!(!decide(false, &[], &[b]));
    }
}
