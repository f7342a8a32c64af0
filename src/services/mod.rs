//! 业务服务层

pub mod audit_service;
pub mod auth_service;
pub mod matrix_service;
pub mod permission_service;

pub use audit_service::{AuditAction, AuditService};
pub use auth_service::AuthService;
pub use matrix_service::MatrixService;
pub use permission_service::PermissionService;
