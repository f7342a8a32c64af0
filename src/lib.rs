//! GreenMine 核心库
//! 权限评估、通用表格查询、对象环境注册表与授权矩阵生成

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;
pub mod auth;
pub mod models;
pub mod schema;
pub mod table;
pub mod environment;
pub mod repository;
pub mod services;
