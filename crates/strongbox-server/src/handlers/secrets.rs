//! Secret RPC method handlers.
//!
//! Payloads are encrypted with the caller's `secretkey` before they reach
//! the store and decrypted on the way out.

use super::HandlerContext;
use crate::error::ServiceError;
use crate::metadata::CallContext;
use crate::methods::{parse_params, MethodHandler};
use crate::store::StoreError;
use crate::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;
use strongbox_core::wire::{
    AddSecretRequest, DeleteSecretRequest, Empty, GetSecretRequest, GetSecretResponse,
    ListSecretsResponse, UpdateSecretRequest, UpdateSecretResponse,
};
use strongbox_core::Secret;
use tracing::{debug, warn};

fn require_name(name: &str) -> ServiceResult<()> {
    if name.is_empty() {
        return Err(ServiceError::invalid("secret name is required"));
    }
    Ok(())
}

/// Replace the plaintext payload with its ciphertext.
fn seal(ctx: &CallContext, mut secret: Secret) -> ServiceResult<Secret> {
    let key = ctx.secret_key()?;
    secret.data = strongbox_crypto::encrypt(key.as_bytes(), &secret.data)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(secret)
}

/// `secrets.list`: the caller's secrets without payloads.
pub struct ListSecretsHandler {
    context: Arc<HandlerContext>,
}

impl ListSecretsHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ListSecretsHandler {
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let _: Empty = parse_params(params)?;
        let user_id = ctx.user_id()?;

        let items = match self.context.store.list(user_id).await {
            Ok(items) => items,
            Err(StoreError::NoSecrets) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(user = user_id, count = items.len(), "Listed secrets");
        Ok(serde_json::to_value(ListSecretsResponse { items })?)
    }
}

/// `secrets.add`: store a new secret at version 1.
pub struct AddSecretHandler {
    context: Arc<HandlerContext>,
}

impl AddSecretHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for AddSecretHandler {
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let req: AddSecretRequest = parse_params(params)?;
        require_name(&req.secret.name)?;
        let user_id = ctx.user_id()?;

        let secret = seal(&ctx, req.secret)?;
        self.context.store.add(user_id, &secret).await?;

        debug!(user = user_id, name = %secret.name, "Secret added");
        Ok(serde_json::to_value(Empty {})?)
    }
}

/// `secrets.update`: replace a secret and return its new version.
pub struct UpdateSecretHandler {
    context: Arc<HandlerContext>,
}

impl UpdateSecretHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for UpdateSecretHandler {
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let req: UpdateSecretRequest = parse_params(params)?;
        require_name(&req.secret.name)?;
        let user_id = ctx.user_id()?;

        let secret = seal(&ctx, req.secret)?;
        let version = self.context.store.update(user_id, &secret).await?;

        debug!(user = user_id, name = %secret.name, version, "Secret updated");
        Ok(serde_json::to_value(UpdateSecretResponse { version })?)
    }
}

/// `secrets.get`: fetch and decrypt one secret.
pub struct GetSecretHandler {
    context: Arc<HandlerContext>,
}

impl GetSecretHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for GetSecretHandler {
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let req: GetSecretRequest = parse_params(params)?;
        require_name(&req.name)?;
        let user_id = ctx.user_id()?;
        let key = ctx.secret_key()?;

        let mut secret = self.context.store.get(user_id, &req.name).await?;
        secret.data = strongbox_crypto::decrypt(key.as_bytes(), &secret.data).map_err(|e| {
            warn!(user = user_id, name = %req.name, error = %e, "Secret decryption failed");
            ServiceError::DecryptionFailed
        })?;

        Ok(serde_json::to_value(GetSecretResponse { secret })?)
    }
}

/// `secrets.delete`: remove one secret.
pub struct DeleteSecretHandler {
    context: Arc<HandlerContext>,
}

impl DeleteSecretHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for DeleteSecretHandler {
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        let req: DeleteSecretRequest = parse_params(params)?;
        require_name(&req.name)?;
        let user_id = ctx.user_id()?;

        self.context.store.delete(user_id, &req.name).await?;

        debug!(user = user_id, name = %req.name, "Secret deleted");
        Ok(serde_json::to_value(Empty {})?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use crate::metadata::Metadata;
    use strongbox_core::wire::metadata::{SECRET_KEY, USER_ID};
    use strongbox_core::{Code, SecretKind};

    fn call_ctx(user: &str, key: Option<&str>) -> CallContext {
        let mut md = Metadata::new().with(USER_ID, user);
        if let Some(key) = key {
            md.insert(SECRET_KEY, key);
        }
        CallContext::new(md)
    }

    fn secret_params(name: &str, data: &[u8]) -> Option<serde_json::Value> {
        let secret = Secret::new(name, SecretKind::Text, data.to_vec()).with_meta("m");
        Some(serde_json::json!({ "secret": secret }))
    }

    fn name_params(name: &str) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "name": name }))
    }

    async fn setup() -> Arc<HandlerContext> {
        let ctx = context().await;
        ctx.store.add_user("alice", "hash").await.unwrap();
        ctx.store.add_user("bob", "hash").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_add_get_round_trip_is_encrypted_at_rest() {
        let ctx = setup().await;
        AddSecretHandler::new(ctx.clone())
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"hello"))
            .await
            .unwrap();

        let stored = ctx.store.get("alice", "note1").await.unwrap();
        assert_ne!(stored.data, b"hello");

        let value = GetSecretHandler::new(ctx)
            .call(call_ctx("alice", Some("k1")), name_params("note1"))
            .await
            .unwrap();
        let resp: GetSecretResponse = serde_json::from_value(value).unwrap();
        assert_eq!(resp.secret.data, b"hello");
        assert_eq!(resp.secret.version, 1);
        assert_eq!(resp.secret.meta, "m");
    }

    #[tokio::test]
    async fn test_get_with_wrong_key() {
        let ctx = setup().await;
        AddSecretHandler::new(ctx.clone())
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"hello"))
            .await
            .unwrap();

        let err = GetSecretHandler::new(ctx)
            .call(call_ctx("alice", Some("k2")), name_params("note1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::DecryptionFailed);
    }

    #[tokio::test]
    async fn test_missing_secret_key() {
        let ctx = setup().await;
        let err = AddSecretHandler::new(ctx.clone())
            .call(call_ctx("alice", None), secret_params("note1", b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = GetSecretHandler::new(ctx)
            .call(call_ctx("alice", None), name_params("note1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let ctx = setup().await;
        let err = AddSecretHandler::new(ctx.clone())
            .call(call_ctx("alice", Some("k1")), secret_params("", b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = DeleteSecretHandler::new(ctx)
            .call(call_ctx("alice", Some("k1")), name_params(""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_update_returns_version() {
        let ctx = setup().await;
        let update = UpdateSecretHandler::new(ctx.clone());

        let err = update
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        AddSecretHandler::new(ctx)
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"v1"))
            .await
            .unwrap();
        let value = update
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"v2"))
            .await
            .unwrap();
        assert_eq!(value["version"], 2);
    }

    #[tokio::test]
    async fn test_list_empty_then_populated() {
        let ctx = setup().await;
        let list = ListSecretsHandler::new(ctx.clone());

        let value = list.call(call_ctx("alice", None), None).await.unwrap();
        let resp: ListSecretsResponse = serde_json::from_value(value).unwrap();
        assert!(resp.items.is_empty());

        AddSecretHandler::new(ctx)
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"x"))
            .await
            .unwrap();
        let value = list.call(call_ctx("alice", None), None).await.unwrap();
        let resp: ListSecretsResponse = serde_json::from_value(value).unwrap();
        assert_eq!(resp.items.len(), 1);
        assert_eq!(resp.items[0].name, "note1");
        assert_eq!(resp.items[0].kind, SecretKind::Text);
    }

    #[tokio::test]
    async fn test_other_users_secrets_invisible() {
        let ctx = setup().await;
        AddSecretHandler::new(ctx.clone())
            .call(call_ctx("alice", Some("k1")), secret_params("note1", b"x"))
            .await
            .unwrap();

        let err = GetSecretHandler::new(ctx.clone())
            .call(call_ctx("bob", Some("k1")), name_params("note1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        let err = DeleteSecretHandler::new(ctx)
            .call(call_ctx("bob", Some("k1")), name_params("note1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }
}
