//! 项目相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    environment::{PageNode, PageObject},
    error::AppError,
    middleware::AppState,
    models::project::{CreateProjectFieldRequest, CreateProjectRequest},
    repository::project_repo::ProjectRepository,
    schema::entities,
    services::audit_service::AuditAction,
    services::matrix_service::{parse_field_name, ApplyFieldRequest},
    table::{self, ScopeFilter, TableParams},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建项目
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .permission_service
        .require_globally(auth_context.user_id, &entities::PROJECT, "create", None)
        .await?;

    let repo = ProjectRepository::new(state.db.clone());
    let leader_id = req.leader_id.unwrap_or(auth_context.user_id);
    let project = repo.create(&req.title, req.description.as_deref(), leader_id).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::ProjectCreate,
            "Project",
            Some(project.id),
            Some(project.id),
            None,
        )
        .await?;

    Ok(Json(json!({ "project": project })))
}

/// 项目列表（通用表格）
pub async fn projects_table(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::PROJECT);

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::PROJECT,
        &columns,
        &params,
        &[],
        &[],
    )
    .await?;

    Ok(Json(data))
}

/// 项目页面环境
pub async fn project_page(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "read",
            project_id,
            Some(project_id),
        )
        .await?;

    let repo = ProjectRepository::new(state.db.clone());
    let project = repo.find_by_id(project_id).await?.ok_or(AppError::NotFound)?;

    let page = PageObject { project, node: PageNode::Project };
    let environment = state.environments.build_environment(&page, "overview");

    Ok(Json(environment))
}

/// 归档项目
pub async fn archive_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "archive",
            project_id,
            Some(project_id),
        )
        .await?;

    let repo = ProjectRepository::new(state.db.clone());
    if !repo.set_archived(project_id, true).await? {
        return Err(AppError::NotFound);
    }

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::ProjectArchive,
            "Project",
            Some(project_id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "archived": true })))
}

/// 创建项目自定义字段定义（对所有项目生效）
pub async fn create_field_def(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateProjectFieldRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;
    // 字段定义合法性与 FieldKind 的解析保持一致
    crate::services::matrix_service::FieldKind::parse(&req.field_kind)
        .map_err(|_| AppError::BadRequest(format!("Unknown field kind: {}", req.field_kind)))?;

    state
        .permission_service
        .require_administrator(auth_context.user_id)
        .await?;

    let repo = ProjectRepository::new(state.db.clone());
    let def = repo.create_field_def(&req).await?;

    Ok(Json(json!({ "field": def })))
}

/// 项目自定义字段表单
pub async fn project_fields_form(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "edit",
            project_id,
            Some(project_id),
        )
        .await?;

    let fields = state.matrix_service.project_fields_form(project_id).await?;

    Ok(Json(json!({ "fields": fields })))
}

/// 提交项目自定义字段值
pub async fn apply_project_field(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ApplyFieldRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::PROJECT,
            "edit",
            project_id,
            Some(project_id),
        )
        .await?;

    let value_id = parse_field_name(&req.name)?;
    state.matrix_service.apply_field(project_id, value_id, &req.value).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::FieldUpdate,
            "Project",
            Some(value_id),
            Some(project_id),
            Some(&req.name),
        )
        .await?;

    Ok(Json(json!({ "updated": true })))
}

/// 项目列表（带归属过滤的示例: 只看自己负责的项目）
pub async fn my_projects_table(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::PROJECT);

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::PROJECT,
        &columns,
        &params,
        &[ScopeFilter {
            column: "leader_id",
            value: table::BindValue::Uuid(auth_context.user_id),
        }],
        &[],
    )
    .await?;

    Ok(Json(data))
}
