//! 数据访问层

pub mod audit_repo;
pub mod inventory_repo;
pub mod issue_repo;
pub mod project_repo;
pub mod role_repo;
pub mod user_repo;
