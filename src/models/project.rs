//! Project domain models and custom project fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub leader_id: Uuid,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-defined custom field attached to every project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectFieldDef {
    pub id: Uuid,
    pub title: String,
    pub field_kind: String,
    pub created_at: DateTime<Utc>,
}

/// Lazily materialized per-project value of a custom field
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectFieldValue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub field_id: Uuid,
    pub value: Option<String>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the creating user when absent
    pub leader_id: Option<Uuid>,
}

/// Create custom field definition request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectFieldRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// One of: boolean, text, integer, select
    pub field_kind: String,
}
