//! 审计日志的 HTTP 处理器

use crate::{auth::middleware::AuthContext, error::AppError, middleware::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub project_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// 最近的审计日志，可按项目过滤
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.permission_service.require_administrator(auth_context.user_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let logs = state.audit_service.recent(query.project_id, limit).await?;

    Ok(Json(json!({ "logs": logs })))
}
