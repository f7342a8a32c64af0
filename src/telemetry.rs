//! 日志与指标初始化

use crate::config::AppConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 初始化结构化日志
///
/// `RUST_LOG` 优先于配置；默认指令把 sqlx 的语句日志压到 warn，
/// 表格端点每次请求两条动态 SQL，debug 级别会刷屏。
pub fn init_telemetry(config: &AppConfig) {
    let default_directives = format!("{},sqlx=warn", config.logging.level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&default_directives));

    let fmt_layer = match config.logging.format.to_lowercase().as_str() {
        // 生产环境: 一行一事件的 JSON，span 关闭时带耗时
        "json" => fmt::layer()
            .json()
            .with_target(false)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .boxed(),
        // 开发环境: 美化输出
        _ => fmt::layer().pretty().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!(
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        filter = %default_directives,
        format = %config.logging.format,
        "Telemetry initialized"
    );
}

/// 注册指标元数据，让采集端拿到单位和说明
pub fn init_metrics() {
    use metrics::Unit;

    metrics::describe_counter!("http_requests_total", "处理完成的 HTTP 请求数，按状态码分标签");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP 请求端到端耗时"
    );
    metrics::describe_counter!("auth_logins_total", "登录成功次数");
    metrics::describe_gauge!("db_pool_connections", "连接池当前连接总数");
    metrics::describe_gauge!("db_pool_idle_connections", "连接池空闲连接数");
    metrics::describe_histogram!(
        "db_health_check_duration_seconds",
        Unit::Seconds,
        "就绪探测的数据库往返耗时"
    );
}
