//! 数据模型模块

pub mod audit;
pub mod inventory;
pub mod issue;
pub mod project;
pub mod role;
pub mod user;
