//! Role repository (项目角色与授权记录数据访问)

use crate::{error::AppError, models::role::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Roles ====================

    /// 列出所有项目角色
    pub async fn list(&self) -> Result<Vec<ProjectRole>, AppError> {
        let roles =
            sqlx::query_as::<_, ProjectRole>("SELECT * FROM project_roles ORDER BY title")
                .fetch_all(&self.db)
                .await?;

        Ok(roles)
    }

    /// 根据 ID 查找角色
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectRole>, AppError> {
        let role = sqlx::query_as::<_, ProjectRole>("SELECT * FROM project_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    /// 根据 slug 查找角色
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<ProjectRole>, AppError> {
        let role =
            sqlx::query_as::<_, ProjectRole>("SELECT * FROM project_roles WHERE string_slug = $1")
                .bind(slug)
                .fetch_optional(&self.db)
                .await?;

        Ok(role)
    }

    /// 创建角色
    pub async fn create(&self, req: &CreateRoleRequest) -> Result<ProjectRole, AppError> {
        let role = sqlx::query_as::<_, ProjectRole>(
            r#"
            INSERT INTO project_roles (title, string_slug, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.string_slug)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await?;

        Ok(role)
    }

    /// 删除角色。匿名角色是权限模型的一部分，不可删除。
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let role = self.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        if role.string_slug == ANONYMOUS_ROLE_SLUG {
            return Err(AppError::BadRequest(
                "The anonymous role cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM project_roles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Assignments ====================

    /// 把用户以某角色加入项目
    pub async fn assign(&self, req: &AssignRoleRequest) -> Result<RoleAssignment, AppError> {
        let assignment = sqlx::query_as::<_, RoleAssignment>(
            r#"
            INSERT INTO role_assignments (user_id, project_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, project_id, role_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(req.user_id)
        .bind(req.project_id)
        .bind(req.role_id)
        .fetch_one(&self.db)
        .await?;

        Ok(assignment)
    }

    /// 移除一条角色指派
    pub async fn unassign(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM role_assignments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 用户在项目内被指派的角色 ID
    pub async fn assigned_role_ids(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT role_id FROM role_assignments WHERE user_id = $1 AND project_id = $2",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// 项目内的所有指派
    pub async fn list_assignments(&self, project_id: Uuid) -> Result<Vec<RoleAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, RoleAssignment>(
            "SELECT * FROM role_assignments WHERE project_id = $1 ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assignments)
    }

    // ==================== Role grants ====================

    /// 给定角色集合中，对 (类, 动作) 持有肯定授权的角色 ID
    pub async fn granted_role_ids(
        &self,
        object_class_name: &str,
        action: &str,
        role_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id FROM role_object_grants
            WHERE object_class_name = $1 AND action = $2 AND is_granted AND role_id = ANY($3)
            "#,
        )
        .bind(object_class_name)
        .bind(action)
        .bind(role_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// 惰性补齐一条授权记录。已存在时什么都不做，并发补齐也只会落一行。
    pub async fn ensure_role_grant(
        &self,
        role_id: Uuid,
        object_class_name: &str,
        action: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO role_object_grants (role_id, object_class_name, action, is_granted)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (role_id, object_class_name, action) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(object_class_name)
        .bind(action)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn find_role_grant(
        &self,
        role_id: Uuid,
        object_class_name: &str,
        action: &str,
    ) -> Result<Option<GrantRecord>, AppError> {
        let grant = sqlx::query_as::<_, GrantRecord>(
            r#"
            SELECT * FROM role_object_grants
            WHERE role_id = $1 AND object_class_name = $2 AND action = $3
            "#,
        )
        .bind(role_id)
        .bind(object_class_name)
        .bind(action)
        .fetch_optional(&self.db)
        .await?;

        Ok(grant)
    }

    /// 更新授权位。角色或记录已消失时影响 0 行。
    pub async fn set_role_grant(
        &self,
        role_id: Uuid,
        object_class_name: &str,
        action: &str,
        is_granted: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE role_object_grants SET is_granted = $4
            WHERE role_id = $1 AND object_class_name = $2 AND action = $3
            "#,
        )
        .bind(role_id)
        .bind(object_class_name)
        .bind(action)
        .bind(is_granted)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Position grants ====================

    /// 职位对 (类, 动作) 是否持有肯定授权
    pub async fn position_has_grant(
        &self,
        position_id: Uuid,
        object_class_name: &str,
        action: &str,
    ) -> Result<bool, AppError> {
        let granted = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM position_object_grants
                WHERE position_id = $1 AND object_class_name = $2 AND action = $3 AND is_granted
            )
            "#,
        )
        .bind(position_id)
        .bind(object_class_name)
        .bind(action)
        .fetch_one(&self.db)
        .await?;

        Ok(granted)
    }

    pub async fn ensure_position_grant(
        &self,
        position_id: Uuid,
        object_class_name: &str,
        action: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO position_object_grants (position_id, object_class_name, action, is_granted)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (position_id, object_class_name, action) DO NOTHING
            "#,
        )
        .bind(position_id)
        .bind(object_class_name)
        .bind(action)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn find_position_grant(
        &self,
        position_id: Uuid,
        object_class_name: &str,
        action: &str,
    ) -> Result<Option<PositionGrant>, AppError> {
        let grant = sqlx::query_as::<_, PositionGrant>(
            r#"
            SELECT * FROM position_object_grants
            WHERE position_id = $1 AND object_class_name = $2 AND action = $3
            "#,
        )
        .bind(position_id)
        .bind(object_class_name)
        .bind(action)
        .fetch_optional(&self.db)
        .await?;

        Ok(grant)
    }

    pub async fn set_position_grant(
        &self,
        position_id: Uuid,
        object_class_name: &str,
        action: &str,
        is_granted: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE position_object_grants SET is_granted = $4
            WHERE position_id = $1 AND object_class_name = $2 AND action = $3
            "#,
        )
        .bind(position_id)
        .bind(object_class_name)
        .bind(action)
        .bind(is_granted)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
