//! Issue repository (问题与目录数据访问)

use crate::{error::AppError, models::issue::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct IssueRepository {
    db: PgPool,
}

impl IssueRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, project_id: Uuid, req: &CreateIssueRequest) -> Result<Issue, AppError> {
        let issue = sqlx::query_as::<_, Issue>(
            r#"
            INSERT INTO issues (project_id, title, description, status_id, priority_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.status_id)
        .bind(req.priority_id)
        .fetch_one(&self.db)
        .await?;

        Ok(issue)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, AppError> {
        let issue = sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(issue)
    }

    pub async fn list_statuses(&self) -> Result<Vec<IssueStatus>, AppError> {
        let statuses =
            sqlx::query_as::<_, IssueStatus>("SELECT * FROM issue_statuses ORDER BY title")
                .fetch_all(&self.db)
                .await?;

        Ok(statuses)
    }

    pub async fn list_priorities(&self) -> Result<Vec<IssuePriority>, AppError> {
        let priorities =
            sqlx::query_as::<_, IssuePriority>("SELECT * FROM issue_priorities ORDER BY title")
                .fetch_all(&self.db)
                .await?;

        Ok(priorities)
    }
}
