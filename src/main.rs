//! GreenMine 服务主入口

use greenmine::{
    auth::JwtService,
    config::AppConfig,
    db, environment,
    middleware::AppState,
    routes, schema, services, telemetry,
};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("greenmine {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(path) = std::env::var("GM_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志与指标
    telemetry::init_telemetry(&config);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "GreenMine starting...");

    // 3. 静态注册表: 结构描述和页面环境都在启动期冻结并校验，
    //    任何不一致在这里失败，而不是在第一个请求里
    let schemas = Arc::new(schema::SchemaRegistry::builtin());
    schemas
        .validate()
        .map_err(|e| anyhow::anyhow!("Schema registry validation failed: {}", e))?;

    let environments = Arc::new(
        environment::descriptors::builtin()
            .build()
            .map_err(|e| anyhow::anyhow!("Environment registry build failed: {}", e))?,
    );

    // 4. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 5. 服务与应用状态
    let jwt_service = Arc::new(JwtService::from_config(&config)?);

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_pool.clone(),
        schemas,
        environments,
        jwt_service: jwt_service.clone(),
        auth_service: Arc::new(services::AuthService::new(db_pool.clone(), jwt_service)),
        permission_service: Arc::new(services::PermissionService::new(db_pool.clone())),
        matrix_service: Arc::new(services::MatrixService::new(db_pool.clone())),
        audit_service: Arc::new(services::AuditService::new(db_pool.clone())),
    });

    // 6. 构建路由
    let app = routes::create_router(app_state.clone());

    // 7. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        "Server listening"
    );

    // 8. 优雅关闭: 信号触发排水，排水时间从信号时刻起最多
    //    graceful_shutdown_timeout_secs
    let drain_deadline = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let shutdown_started = Arc::new(Notify::new());
    let started = shutdown_started.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        started.notify_one();
    });

    serve_with_drain_deadline(server.into_future(), shutdown_started, drain_deadline).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 运行服务器直到自然退出；信号触发后排水超过 deadline 则放弃剩余连接
async fn serve_with_drain_deadline<F, E>(
    server: F,
    shutdown_started: Arc<Notify>,
    deadline: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
{
    tokio::pin!(server);
    tokio::select! {
        result = &mut server => result,
        _ = async {
            shutdown_started.notified().await;
            tokio::time::sleep(deadline).await;
        } => {
            tracing::warn!("Graceful shutdown deadline reached, abandoning open connections");
            Ok(())
        }
    }
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("greenmine {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: greenmine [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过环境变量完成，前缀 GM_");
}
