//! User and position domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Global position (distinct from per-project roles)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: Uuid,
    pub title: String,
    pub is_administrator: bool,
    pub created_at: DateTime<Utc>,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub title: String,
    pub email: Option<String>,
    pub position_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User joined with their position's administrator flag
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPosition {
    pub id: Uuid,
    pub username: String,
    pub title: String,
    pub position_id: Option<Uuid>,
    pub is_administrator: bool,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub user: UserSummary,
}

/// Public user summary
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub title: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            title: user.title.clone(),
        }
    }
}
