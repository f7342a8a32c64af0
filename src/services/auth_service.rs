//! 认证服务

use crate::{
    auth::{JwtService, PasswordHasher},
    error::AppError,
    models::user::{LoginRequest, LoginResponse, UserSummary},
    repository::user_repo::UserRepository,
    services::audit_service::{AuditAction, AuditService},
};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    password_hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_service: Arc<JwtService>) -> Self {
        Self { db, jwt_service, password_hasher: PasswordHasher::new() }
    }

    /// 用户名密码登录，签发访问令牌
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        // 用户不存在和密码错误返回同一个错误，不泄露账号是否存在
        let user = user_repo
            .find_by_username(&req.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.password_hasher.verify(&req.password, &user.password_hash)?;

        let access_token = self.jwt_service.generate_access_token(&user.id, &user.username)?;

        let audit = AuditService::new(self.db.clone());
        audit
            .log(Some(user.id), AuditAction::UserLogin, "User", Some(user.id), None, None)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        metrics::counter!("auth_logins_total").increment(1);

        Ok(LoginResponse {
            access_token,
            expires_in: self.jwt_service.access_token_exp_secs(),
            user: UserSummary::from(&user),
        })
    }
}
