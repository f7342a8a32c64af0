//! User repository (用户数据访问)

use crate::{error::AppError, models::user::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据用户名查找用户
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 查找用户并带出其职位的管理员标志
    pub async fn find_with_position(&self, id: Uuid) -> Result<Option<UserWithPosition>, AppError> {
        let user = sqlx::query_as::<_, UserWithPosition>(
            r#"
            SELECT u.id, u.username, u.title, u.position_id,
                   COALESCE(p.is_administrator, FALSE) AS is_administrator
            FROM users u
            LEFT JOIN positions p ON p.id = u.position_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 创建用户
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        title: &str,
        email: Option<&str>,
        position_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, title, email, position_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(title)
        .bind(email)
        .bind(position_id)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// 列出所有职位
    pub async fn list_positions(&self) -> Result<Vec<Position>, AppError> {
        let positions =
            sqlx::query_as::<_, Position>("SELECT * FROM positions ORDER BY title")
                .fetch_all(&self.db)
                .await?;

        Ok(positions)
    }

    /// 根据 ID 查找职位
    pub async fn find_position_by_id(&self, id: Uuid) -> Result<Option<Position>, AppError> {
        let position = sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(position)
    }

    /// 根据标题查找职位
    pub async fn find_position_by_title(&self, title: &str) -> Result<Option<Position>, AppError> {
        let position =
            sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE title = $1")
                .bind(title)
                .fetch_optional(&self.db)
                .await?;

        Ok(position)
    }
}
