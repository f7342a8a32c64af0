//! Network / host / service inventory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Network under a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Network {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub address: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Host under a project, optionally placed in a network
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Host {
    pub id: Uuid,
    pub project_id: Uuid,
    pub network_id: Option<Uuid>,
    pub title: String,
    pub ip_address: String,
    pub os: Option<String>,
    pub is_online: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service exposed by a host
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub project_id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub port: i32,
    pub protocol: String,
    pub state: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create network request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNetworkRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub address: String,
    pub description: Option<String>,
}

/// Create host request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(ip)]
    pub ip_address: String,
    pub network_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub os: Option<String>,
    pub description: Option<String>,
}

/// Create service request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    pub host_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: i32,
    /// tcp or udp
    pub protocol: Option<String>,
    pub description: Option<String>,
}
