//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需认证）
    let auth_routes = Router::new().route("/api/v1/auth/login", post(handlers::auth::login));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        // 当前用户信息
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))

        // 项目
        .route(
            "/api/v1/projects",
            get(handlers::project::projects_table).post(handlers::project::create_project),
        )
        .route("/api/v1/projects/mine", get(handlers::project::my_projects_table))
        .route("/api/v1/projects/{id}", get(handlers::project::project_page))
        .route("/api/v1/projects/{id}/archive", post(handlers::project::archive_project))
        .route(
            "/api/v1/projects/{id}/fields",
            get(handlers::project::project_fields_form)
                .post(handlers::project::apply_project_field),
        )

        // 网络
        .route(
            "/api/v1/projects/{id}/networks",
            get(handlers::inventory::networks_table).post(handlers::inventory::create_network),
        )

        // 主机
        .route(
            "/api/v1/projects/{id}/hosts",
            get(handlers::inventory::hosts_table).post(handlers::inventory::create_host),
        )
        .route(
            "/api/v1/projects/{id}/hosts/{host_id}",
            get(handlers::inventory::host_page),
        )

        // 服务
        .route(
            "/api/v1/projects/{id}/services",
            get(handlers::inventory::services_table).post(handlers::inventory::create_service),
        )

        // 问题
        .route(
            "/api/v1/projects/{id}/issues",
            get(handlers::issue::issues_table).post(handlers::issue::create_issue),
        )
        .route("/api/v1/issue-statuses", get(handlers::issue::list_statuses))
        .route("/api/v1/issue-priorities", get(handlers::issue::list_priorities))

        // 指派（项目负责人或 manage_permissions 授权）
        .route("/api/v1/assignments", post(handlers::role::assign_role))
        .route(
            "/api/v1/projects/{id}/assignments",
            get(handlers::role::list_assignments),
        )
        .route(
            "/api/v1/projects/{id}/assignments/{assignment_id}/remove",
            post(handlers::role::unassign_role),
        )

        // 管理后台: 角色与权限矩阵
        .route(
            "/api/v1/admin/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route(
            "/api/v1/admin/roles/{id}/delete",
            post(handlers::role::delete_role),
        )
        .route("/api/v1/admin/role-matrix", get(handlers::role::role_matrix))
        .route("/api/v1/admin/position-matrix", get(handlers::role::position_matrix))
        .route("/api/v1/admin/grants", post(handlers::role::apply_grant))

        // 管理后台: 项目自定义字段定义
        .route("/api/v1/admin/project-fields", post(handlers::project::create_field_def))

        // 管理后台: 审计日志
        .route("/api/v1/admin/audit-logs", get(handlers::audit::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
