//! JSON-RPC client for the Strongbox server.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use strongbox_core::rpc::{JsonRpcRequest, JsonRpcResponse};
use strongbox_core::wire::{
    metadata, methods, AddSecretRequest, DeleteSecretRequest, Empty, GetSecretRequest,
    GetSecretResponse, ListSecretsResponse, UpdateSecretRequest, UpdateSecretResponse, User,
    UserAuthToken,
};
use strongbox_core::{Secret, SecretItem, SecretString};
use tracing::debug;

/// Read side of the remote store, as needed by sync and offline fallback.
#[async_trait]
pub trait RemoteSecrets: Send + Sync {
    async fn list_secrets(&self) -> Result<Vec<SecretItem>>;

    async fn get_secret(&self, name: &str) -> Result<Secret>;
}

/// HTTP client for the server's `/rpc` endpoint.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
    secret_key: Option<SecretString>,
}

impl RpcClient {
    /// Create a client for `server` (e.g. `http://127.0.0.1:3200`).
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/rpc", server.trim_end_matches('/')),
            token: None,
            secret_key: None,
        })
    }

    /// Attach a session token to every call.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Attach the envelope passphrase to every call.
    pub fn with_secret_key(mut self, key: SecretString) -> Self {
        self.secret_key = Some(key);
        self
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: &P) -> Result<R> {
        let request = JsonRpcRequest::new(method).with_params(serde_json::to_value(params)?);

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.header(
                metadata::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        if let Some(key) = &self.secret_key {
            builder = builder.header(metadata::SECRET_KEY, key.expose_secret());
        }

        debug!(method, "Sending RPC request");
        let response: JsonRpcResponse = builder.send().await?.error_for_status()?.json().await?;

        if let Some(err) = response.error {
            return Err(ClientError::Status {
                code: err.status(),
                message: err.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("response has no result".to_string()))?;
        serde_json::from_value(result).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Create an account and return its session token.
    pub async fn register(&self, login: &str, password: SecretString) -> Result<SecretString> {
        let token: UserAuthToken = self.call(methods::REGISTER, &User::new(login, password)).await?;
        Ok(token.token)
    }

    /// Log in and return a session token.
    pub async fn login(&self, login: &str, password: SecretString) -> Result<SecretString> {
        let token: UserAuthToken = self.call(methods::LOGIN, &User::new(login, password)).await?;
        Ok(token.token)
    }

    pub async fn list(&self) -> Result<Vec<SecretItem>> {
        let resp: ListSecretsResponse = self.call(methods::LIST_SECRETS, &Empty {}).await?;
        Ok(resp.items)
    }

    pub async fn add(&self, secret: &Secret) -> Result<()> {
        let req = AddSecretRequest {
            secret: secret.clone(),
        };
        let _: Empty = self.call(methods::ADD_SECRET, &req).await?;
        Ok(())
    }

    /// Replace a secret; returns the new version.
    pub async fn update(&self, secret: &Secret) -> Result<i64> {
        let req = UpdateSecretRequest {
            secret: secret.clone(),
        };
        let resp: UpdateSecretResponse = self.call(methods::UPDATE_SECRET, &req).await?;
        Ok(resp.version)
    }

    pub async fn get(&self, name: &str) -> Result<Secret> {
        let req = GetSecretRequest {
            name: name.to_string(),
        };
        let resp: GetSecretResponse = self.call(methods::GET_SECRET, &req).await?;
        Ok(resp.secret)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let req = DeleteSecretRequest {
            name: name.to_string(),
        };
        let _: Empty = self.call(methods::DELETE_SECRET, &req).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteSecrets for RpcClient {
    async fn list_secrets(&self) -> Result<Vec<SecretItem>> {
        self.list().await
    }

    async fn get_secret(&self, name: &str) -> Result<Secret> {
        self.get(name).await
    }
}
