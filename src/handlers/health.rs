//! 健康检查处理器

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 存活探针
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 就绪探针，检查数据库连通性
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    db::record_pool_metrics(&state.db);

    match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => {
            (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response()
        }
        db::HealthStatus::Unhealthy(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "reason": reason })),
        )
            .into_response(),
    }
}
