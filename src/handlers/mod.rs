//! HTTP 处理器

pub mod audit;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod issue;
pub mod project;
pub mod role;

use crate::schema::EntitySchema;

/// 实体的默认表格列清单
pub(crate) fn default_columns(schema: &'static EntitySchema) -> Vec<String> {
    schema.default_columns.iter().map(|c| c.to_string()).collect()
}
