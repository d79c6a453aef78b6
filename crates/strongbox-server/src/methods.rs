//! RPC method registry and handlers.

use crate::error::ServiceError;
use crate::metadata::CallContext;
use crate::ServiceResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for RPC method handlers.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Handle the method call.
    async fn call(
        &self,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value>;
}

/// Registry for RPC methods.
pub struct MethodRegistry {
    /// Registered methods.
    methods: RwLock<HashMap<String, Arc<dyn MethodHandler>>>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    /// Create an empty method registry.
    pub fn new() -> Self {
        Self {
            methods: RwLock::new(HashMap::new()),
        }
    }

    /// Register a method handler.
    pub async fn register(&self, name: impl Into<String>, handler: Arc<dyn MethodHandler>) {
        let mut methods = self.methods.write().await;
        methods.insert(name.into(), handler);
    }

    /// Call a method.
    pub async fn call(
        &self,
        name: &str,
        ctx: CallContext,
        params: Option<serde_json::Value>,
    ) -> ServiceResult<serde_json::Value> {
        // Release the lock before the handler runs.
        let handler = {
            let methods = self.methods.read().await;
            methods
                .get(name)
                .cloned()
                .ok_or_else(|| ServiceError::MethodNotFound(name.to_string()))?
        };

        debug!("Calling method: {}", name);
        handler.call(ctx, params).await
    }

    /// List registered methods, sorted.
    pub async fn list(&self) -> Vec<String> {
        let methods = self.methods.read().await;
        let mut names: Vec<String> = methods.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Decode method parameters. Missing parameters decode from `{}`.
pub fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> ServiceResult<T> {
    let value = params.unwrap_or_else(|| serde_json::json!({}));
    serde_json::from_value(value).map_err(|e| ServiceError::invalid(format!("invalid params: {}", e)))
}
