//! PostgreSQL 连接池、迁移执行与就绪探测

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("database migration failed: {0}")]
    MigrationFailed(String),
}

/// 就绪探测结果
#[derive(Debug, Clone)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

/// 按配置建池
///
/// test_before_acquire 打开: 借出前先验证连接，长空闲后的死连接
/// 不会流进请求路径。
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Database pool ready"
    );

    Ok(pool)
}

/// 执行 migrations/ 下的全部迁移，仅在启动期调用
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    tracing::info!("Database migrations up to date");
    Ok(())
}

/// 就绪探测: 一次数据库往返，耗时进直方图
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    let started = Instant::now();
    let result = sqlx::query("SELECT 1").fetch_one(pool).await;
    metrics::histogram!("db_health_check_duration_seconds")
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 刷新连接池规模指标，就绪探测端点顺带调用
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("db_pool_connections").set(pool.size() as f64);
    metrics::gauge!("db_pool_idle_connections").set(pool.num_idle() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_carries_reason() {
        let unhealthy = HealthStatus::Unhealthy("Connection refused".to_string());

        match unhealthy {
            HealthStatus::Unhealthy(msg) => assert_eq!(msg, "Connection refused"),
            _ => panic!("expected unhealthy"),
        }
    }

    #[test]
    fn test_db_error_messages_name_the_phase() {
        let err = DbError::MigrationFailed("checksum mismatch".to_string());
        assert_eq!(err.to_string(), "database migration failed: checksum mismatch");

        let err = DbError::ConnectionFailed("refused".to_string());
        assert!(err.to_string().starts_with("database connection failed"));
    }
}
