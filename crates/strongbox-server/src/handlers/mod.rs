//! RPC method handlers.
//!
//! Handlers read the caller's identity only from the [`CallContext`]; user
//! ids in request bodies are never trusted.
//!
//! [`CallContext`]: crate::metadata::CallContext

pub mod secrets;
pub mod users;

use crate::auth::CredentialManager;
use crate::methods::MethodRegistry;
use crate::store::SecretStore;
use std::sync::Arc;
use strongbox_core::wire::methods;

pub use secrets::{
    AddSecretHandler, DeleteSecretHandler, GetSecretHandler, ListSecretsHandler,
    UpdateSecretHandler,
};
pub use users::{LoginHandler, RegisterHandler};

/// Shared state for handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub store: SecretStore,
    pub credentials: Arc<CredentialManager>,
}

impl HandlerContext {
    pub fn new(store: SecretStore, credentials: Arc<CredentialManager>) -> Self {
        Self { store, credentials }
    }
}

/// Register every RPC method.
pub async fn register_all(registry: &MethodRegistry, context: HandlerContext) {
    let ctx = Arc::new(context);

    // User methods
    registry
        .register(methods::REGISTER, Arc::new(RegisterHandler::new(ctx.clone())))
        .await;
    registry
        .register(methods::LOGIN, Arc::new(LoginHandler::new(ctx.clone())))
        .await;

    // Secret methods
    registry
        .register(
            methods::LIST_SECRETS,
            Arc::new(ListSecretsHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(methods::ADD_SECRET, Arc::new(AddSecretHandler::new(ctx.clone())))
        .await;
    registry
        .register(
            methods::UPDATE_SECRET,
            Arc::new(UpdateSecretHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(methods::GET_SECRET, Arc::new(GetSecretHandler::new(ctx.clone())))
        .await;
    registry
        .register(methods::DELETE_SECRET, Arc::new(DeleteSecretHandler::new(ctx)))
        .await;
}
