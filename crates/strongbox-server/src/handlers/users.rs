//! Registration and login.

use super::HandlerContext;
use crate::error::ServiceError;
use crate::metadata::CallContext;
use crate::methods::{parse_params, MethodHandler};
use crate::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;
use strongbox_core::wire::{User, UserAuthToken};
use tracing::{debug, info};

fn require_credentials(user: &User) -> ServiceResult<()> {
    if user.login.is_empty() || user.password.is_empty() {
        return Err(ServiceError::invalid("login and password are required"));
    }
    Ok(())
}

fn token_response(ctx: &HandlerContext, user_id: &str) -> ServiceResult<serde_json::Value> {
    let token = ctx
        .credentials
        .issue_token(user_id)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(serde_json::to_value(UserAuthToken {
        token: token.into(),
    })?)
}

/// `user.register`: create an account and return a session token.
pub struct RegisterHandler {
    context: Arc<HandlerContext>,
}

impl RegisterHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for RegisterHandler {
    async fn call(
        &self,
        _ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let user: User = parse_params(params)?;
        require_credentials(&user)?;

        // Argon2 is deliberately slow; keep it off the async workers.
        let password = user.password.clone();
        let hash = tokio::task::spawn_blocking(move || {
            strongbox_crypto::hash_password(password.expose_secret())
        })
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.context.store.add_user(&user.login, &hash).await?;
        info!(user = %user.login, "User registered");

        token_response(&self.context, &user.login)
    }
}

/// `user.login`: check a password and return a session token.
pub struct LoginHandler {
    context: Arc<HandlerContext>,
}

impl LoginHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for LoginHandler {
    async fn call(
        &self,
        _ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let user: User = parse_params(params)?;
        require_credentials(&user)?;

        let stored = self.context.store.get_user(&user.login).await?;

        let password = user.password.clone();
        let matches = tokio::task::spawn_blocking(move || {
            strongbox_crypto::verify_password(&stored.password_hash, password.expose_secret())
        })
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

        if !matches {
            debug!(user = %user.login, "Login rejected: wrong password");
            return Err(ServiceError::PermissionDenied);
        }

        debug!(user = %user.login, "User logged in");
        token_response(&self.context, &user.login)
    }
}
