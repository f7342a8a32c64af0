//! 网络/主机/服务清单的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    environment::{PageNode, PageObject},
    error::AppError,
    middleware::AppState,
    models::inventory::{CreateHostRequest, CreateNetworkRequest, CreateServiceRequest},
    repository::{inventory_repo::InventoryRepository, project_repo::ProjectRepository},
    schema::entities,
    services::audit_service::AuditAction,
    table::{self, BindValue, ScopeFilter, TableParams},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建网络
pub async fn create_network(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateNetworkRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::NETWORK, "create", project_id, None)
        .await?;

    let repo = InventoryRepository::new(state.db.clone());
    let network = repo.create_network(project_id, &req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::NetworkCreate,
            "Network",
            Some(network.id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "network": network })))
}

/// 网络列表（通用表格）
pub async fn networks_table(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::NETWORK, "read", project_id, None)
        .await?;

    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::NETWORK);

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::NETWORK,
        &columns,
        &params,
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &[],
    )
    .await?;

    Ok(Json(data))
}

/// 创建主机
pub async fn create_host(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateHostRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::HOST, "create", project_id, None)
        .await?;

    let repo = InventoryRepository::new(state.db.clone());
    let host = repo.create_host(project_id, &req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::HostCreate,
            "Host",
            Some(host.id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "host": host })))
}

/// 主机列表（通用表格）
pub async fn hosts_table(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::HOST, "read", project_id, None)
        .await?;

    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::HOST);

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::HOST,
        &columns,
        &params,
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &[],
    )
    .await?;

    Ok(Json(data))
}

/// 主机页面环境
pub async fn host_page(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path((project_id, host_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(
            auth_context.user_id,
            &entities::HOST,
            "read",
            project_id,
            Some(host_id),
        )
        .await?;

    let repo = InventoryRepository::new(state.db.clone());
    let host = repo.find_host(host_id).await?.ok_or(AppError::NotFound)?;
    if host.project_id != project_id {
        return Err(AppError::NotFound);
    }

    let project_repo = ProjectRepository::new(state.db.clone());
    let project = project_repo
        .find_by_id(project_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = PageObject { project, node: PageNode::Host(host) };
    let environment = state.environments.build_environment(&page, "hosts");

    Ok(Json(environment))
}

/// 创建服务
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::SERVICE, "create", project_id, None)
        .await?;

    let repo = InventoryRepository::new(state.db.clone());
    // 宿主主机必须属于同一项目
    let host = repo.find_host(req.host_id).await?.ok_or(AppError::NotFound)?;
    if host.project_id != project_id {
        return Err(AppError::NotFound);
    }

    let service = repo.create_service(project_id, &req).await?;

    state
        .audit_service
        .log(
            Some(auth_context.user_id),
            AuditAction::ServiceCreate,
            "Service",
            Some(service.id),
            Some(project_id),
            None,
        )
        .await?;

    Ok(Json(json!({ "service": service })))
}

/// 服务列表（通用表格）
pub async fn services_table(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(project_id): Path<Uuid>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_on_project(auth_context.user_id, &entities::SERVICE, "read", project_id, None)
        .await?;

    let params = TableParams::from_pairs(&pairs)?;
    let columns = super::default_columns(&entities::SERVICE);

    let data = table::fetch_table_data(
        &state.db,
        &state.schemas,
        &state.config.table,
        &entities::SERVICE,
        &columns,
        &params,
        &[ScopeFilter { column: "project_id", value: BindValue::Uuid(project_id) }],
        &[],
    )
    .await?;

    Ok(Json(data))
}
