//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState,
    models::user::LoginRequest, repository::user_repo::UserRepository,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(&req).await?;
    Ok(Json(response))
}

/// 当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_with_position(auth_context.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "title": user.title,
        "position_id": user.position_id,
        "is_administrator": user.is_administrator,
    })))
}
