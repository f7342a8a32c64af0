//! 问题跟踪的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::issue::CreateIssueRequest,
    repository::issue_repo::IssueRepository,
    schema::entities,
    services::audit_service::AuditAction,
    table::{self, BindValue, ScopeFilter, Synthesizer, TableParams},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建问题
pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateIssueRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::ISSUE, "create", project_id, None)
        .await?;

    let repo = IssueRepository::new(state.db.clone());
    let issue = repo.create(project_id, &req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::IssueCreate,
            "Issue",
            Some(issue.id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "issue": issue })))
}

/// 问题列表（通用表格）
///
/// 除默认列外合成 `_bg_color` 列: 取优先级颜色，供前端给整行着色。
pub async fn issues_table(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::ISSUE, "read", project_id, None)
        .await?;

    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::ISSUE);

    let synthesizers: Vec<(String, Synthesizer)> = vec![(
        "_bg_color".to_string(),
        Box::new(|row| {
            row.get("priority.color-input")
                .cloned()
                .unwrap_or(Value::String(String::new()))
        }),
    )];

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::ISSUE,
        &columns,
        &params,
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &synthesizers,
    )
    .await?;

    Ok(Json(data))
}

/// 问题状态目录
pub async fn list_statuses(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_globally(auth_context.user_id, &entities::ISSUE_STATUS, "read", None)
        .await?;

    let repo = IssueRepository::new(state.db.clone());
    let statuses = repo.list_statuses().await?;

    Ok(Json(json!({ "statuses": statuses })))
}

/// 问题优先级目录
pub async fn list_priorities(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_globally(auth_context.user_id, &entities::ISSUE_PRIORITY, "read", None)
        .await?;

    let repo = IssueRepository::new(state.db.clone());
    let priorities = repo.list_priorities().await?;

    Ok(Json(json!({ "priorities": priorities })))
}
