//! Project role, assignment and grant-record domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Slug of the implicit role applied to users without an assignment
pub const ANONYMOUS_ROLE_SLUG: &str = "anonymous";

/// Project role (a named permission bundle within a project)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRole {
    pub id: Uuid,
    pub title: String,
    pub string_slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a project under a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Stored grant record: may role perform action on instances of a class
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GrantRecord {
    pub id: Uuid,
    pub role_id: Uuid,
    pub object_class_name: String,
    pub action: String,
    pub is_granted: bool,
}

/// Position-scoped grant record for catalog objects
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PositionGrant {
    pub id: Uuid,
    pub position_id: Uuid,
    pub object_class_name: String,
    pub action: String,
    pub is_granted: bool,
}

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub string_slug: String,
    pub description: Option<String>,
}

/// Assign role request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Uuid,
}
