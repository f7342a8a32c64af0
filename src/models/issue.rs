//! Issue and issue catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Issue (a finding within a project)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Issue status catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueStatus {
    pub id: Uuid,
    pub title: String,
}

/// Issue priority catalog entry (color drives list row background)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssuePriority {
    pub id: Uuid,
    pub title: String,
    pub color: String,
}

/// Create issue request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIssueRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
}
