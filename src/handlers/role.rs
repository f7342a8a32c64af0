//! 角色、指派与权限矩阵的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::role::{AssignRoleRequest, CreateRoleRequest},
    repository::role_repo::RoleRepository,
    schema::entities,
    services::audit_service::AuditAction,
    services::matrix_service::{ApplyGrantRequest, GrantKey, GrantOwner},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

// ==================== Roles ====================

/// 列出项目角色
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let repo = RoleRepository::new(state.db.clone());
    let roles = repo.list().await?;

    Ok(Json(json!({ "roles": roles })))
}

/// 创建项目角色
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.permission_service.require_administrator(auth_context.user_id).await?;

    let repo = RoleRepository::new(state.db.clone());
    let role = repo.create(&req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::RoleCreate,
            "ProjectRole",
            Some(role.id),
            None,
            None,
        )
        .await?;

    Ok(Json(json!({ "role": role })))
}

/// 删除项目角色
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let repo = RoleRepository::new(state.db.clone());
    if !repo.delete(role_id).await? {
        return Err(AppError::NotFound);
    }

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::RoleDelete,
            "ProjectRole",
            Some(role_id),
            None,
            None,
        )
        .await?;

    Ok(Json(json!({ "deleted": true })))
}

// ==================== Assignments ====================

/// 把用户以某角色加入项目
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "manage_permissions",
            req.project_id,
            Some(req.project_id),
        )
        .await?;

    let repo = RoleRepository::new(state.db.clone());
    let assignment = repo.assign(&req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::RoleAssign,
            "RoleAssignment",
            Some(assignment.id),
            Some(req.project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "assignment": assignment })))
}

/// 项目内的所有指派
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "manage_permissions",
            project_id,
            Some(project_id),
        )
        .await?;

    let repo = RoleRepository::new(state.db.clone());
    let assignments = repo.list_assignments(project_id).await?;

    Ok(Json(json!({ "assignments": assignments })))
}

/// 移除一条指派
pub async fn unassign_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path((project_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "manage_permissions",
            project_id,
            Some(project_id),
        )
        .await?;

    let repo = RoleRepository::new(state.db.clone());
    if !repo.unassign(assignment_id).await? {
        return Err(AppError::NotFound);
    }

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::RoleUnassign,
            "RoleAssignment",
            Some(assignment_id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "removed": true })))
}

// ==================== Grant matrices ====================

/// 角色权限矩阵表单
pub async fn role_matrix(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let fields = state.matrix_service.role_matrix(&state.schemas).await?;

    Ok(Json(json!({ "fields": fields })))
}

/// 职位权限矩阵表单
pub async fn position_matrix(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let fields = state.matrix_service.position_matrix(&state.schemas).await?;

    Ok(Json(json!({ "fields": fields })))
}

/// 提交一个授权位
pub async fn apply_grant(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<ApplyGrantRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let key = GrantKey::parse(&req.name)?;
    state.matrix_service.apply_grant(&key, req.granted).await?;

    let owner_id = match key.owner {
        GrantOwner::Role(id) | GrantOwner::Position(id) => id,
    };
    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::GrantUpdate,
            &key.object_class,
            Some(owner_id),
            None,
            Some(&req.name),
        )
        .await?;

    Ok(Json(json!({ "updated": true })))
}
