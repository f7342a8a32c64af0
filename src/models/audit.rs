//! Audit log models

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Stored audit log entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub object_class: String,
    pub object_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub detail: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
