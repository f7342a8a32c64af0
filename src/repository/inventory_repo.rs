//! Inventory repository (网络/主机/服务数据访问)

use crate::{error::AppError, models::inventory::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct InventoryRepository {
    db: PgPool,
}

impl InventoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Networks ====================

    pub async fn create_network(
        &self,
        project_id: Uuid,
        req: &CreateNetworkRequest,
    ) -> Result<Network, AppError> {
        let network = sqlx::query_as::<_, Network>(
            r#"
            INSERT INTO networks (project_id, title, address, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(&req.title)
        .bind(&req.address)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await?;

        Ok(network)
    }

    pub async fn find_network(&self, id: Uuid) -> Result<Option<Network>, AppError> {
        let network = sqlx::query_as::<_, Network>("SELECT * FROM networks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(network)
    }

    // ==================== Hosts ====================

    pub async fn create_host(
        &self,
        project_id: Uuid,
        req: &CreateHostRequest,
    ) -> Result<Host, AppError> {
        let host = sqlx::query_as::<_, Host>(
            r#"
            INSERT INTO hosts (project_id, network_id, title, ip_address, os, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(req.network_id)
        .bind(&req.title)
        .bind(&req.ip_address)
        .bind(&req.os)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await?;

        Ok(host)
    }

    pub async fn find_host(&self, id: Uuid) -> Result<Option<Host>, AppError> {
        let host = sqlx::query_as::<_, Host>("SELECT * FROM hosts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(host)
    }

    // ==================== Services ====================

    pub async fn create_service(
        &self,
        project_id: Uuid,
        req: &CreateServiceRequest,
    ) -> Result<Service, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (project_id, host_id, title, port, protocol, description)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'tcp'), $6)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(req.host_id)
        .bind(&req.title)
        .bind(req.port)
        .bind(&req.protocol)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await?;

        Ok(service)
    }

    pub async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(service)
    }
}
