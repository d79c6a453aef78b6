//! HTTP server exposing the RPC methods.
//!
//! Calls arrive as JSON-RPC 2.0 over `POST /rpc`. Request headers become
//! call metadata; every method except registration and login needs a valid
//! session token.

use crate::auth::CredentialManager;
use crate::error::{ServerError, ServiceError};
use crate::handlers::{register_all, HandlerContext};
use crate::metadata::{CallContext, Metadata};
use crate::methods::MethodRegistry;
use crate::store::SecretStore;
use crate::{Result, ServiceResult};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use strongbox_core::rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use strongbox_core::wire::metadata::USER_ID;
use strongbox_core::wire::methods::PUBLIC;
use strongbox_core::{Code, ServerConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Server state shared by all requests.
pub struct ServerState {
    /// Method registry.
    pub methods: Arc<MethodRegistry>,

    /// Token issuer and validator.
    pub credentials: Arc<CredentialManager>,
}

impl ServerState {
    /// Strip any caller-supplied identity, then attach the token's identity.
    fn authenticate(&self, method: &str, metadata: &mut Metadata) -> ServiceResult<()> {
        if metadata.remove(USER_ID).is_some() {
            warn!(method, "Dropped caller-supplied userid metadata");
        }

        if PUBLIC.contains(&method) {
            return Ok(());
        }

        let token = metadata.bearer_token().ok_or(ServiceError::Unauthenticated)?;
        let user_id = self.credentials.validate_token(token).map_err(|e| {
            debug!(method, error = %e, "Token rejected");
            ServiceError::Unauthenticated
        })?;

        metadata.insert(USER_ID, user_id);
        Ok(())
    }

    /// Authenticate and run one call on its own task.
    ///
    /// The task is detached from the HTTP request, so a client that hangs up
    /// does not cancel a write halfway; the store deadline bounds it instead.
    async fn dispatch(
        &self,
        method: String,
        params: Option<serde_json::Value>,
        mut metadata: Metadata,
    ) -> ServiceResult<serde_json::Value> {
        self.authenticate(&method, &mut metadata)?;

        let methods = self.methods.clone();
        let ctx = CallContext::new(metadata);
        tokio::spawn(async move { methods.call(&method, ctx, params).await })
            .await
            .map_err(|e| ServiceError::Internal(format!("call task failed: {}", e)))?
    }
}

/// The Strongbox RPC server.
pub struct Server {
    state: Arc<ServerState>,
    store: SecretStore,
    config: ServerConfig,
}

impl Server {
    /// Validate the configuration, open the database and register handlers.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let store = SecretStore::connect(&config.database_url, config.store_timeout()).await?;
        Self::with_store(config, store).await
    }

    /// Build a server over an existing store.
    pub async fn with_store(config: ServerConfig, store: SecretStore) -> Result<Self> {
        let credentials = Arc::new(CredentialManager::new(
            config.signing_key()?.clone(),
            config.token_ttl(),
        )?);

        let methods = Arc::new(MethodRegistry::new());
        register_all(&methods, HandlerContext::new(store.clone(), credentials.clone())).await;

        let state = Arc::new(ServerState {
            methods,
            credentials,
        });

        Ok(Self {
            state,
            store,
            config,
        })
    }

    /// Create the Axum router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/rpc", post(rpc_handler))
            .route("/health", get(health_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .address
            .parse()
            .map_err(|e| ServerError::Serve(format!("invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr).await?;
        info!("Starting Strongbox server on {}", addr);

        self.run_until(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` completes.
    ///
    /// After the shutdown future fires no new connections are accepted.
    /// In-flight calls get the configured grace window, then the remaining
    /// connections are dropped.
    pub async fn run_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let app = self.router();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let mut serve = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            finished = &mut serve => {
                self.store.close().await;
                return flatten(finished);
            }
            _ = shutdown => {}
        }

        let grace = self.config.shutdown_grace();
        info!(?grace, "Shutting down, draining in-flight calls");
        let _ = stop_tx.send(());

        let result = match tokio::time::timeout(grace, &mut serve).await {
            Ok(finished) => flatten(finished),
            Err(_) => {
                warn!("Grace window elapsed, closing remaining connections");
                serve.abort();
                Ok(())
            }
        };

        self.store.close().await;
        info!("Server stopped");
        result
    }
}

fn flatten(
    finished: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match finished {
        Ok(result) => result.map_err(ServerError::Io),
        Err(e) => Err(ServerError::Serve(e.to_string())),
    }
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// `POST /rpc` handler.
async fn rpc_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<JsonRpcResponse> {
    Json(handle_request(&state, Metadata::from_headers(&headers), &body).await)
}

/// Decode one JSON-RPC request, dispatch it and encode the outcome.
pub async fn handle_request(
    state: &ServerState,
    metadata: Metadata,
    body: &[u8],
) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string()));
        }
    };

    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(
            request.id,
            JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
        );
    }

    debug!("Received RPC request: {}", request.method);

    let method = request.method.clone();
    match state.dispatch(request.method, request.params, metadata).await {
        Ok(value) => JsonRpcResponse::success(request.id, value),
        Err(e) => {
            match e.code() {
                Code::Internal | Code::Unavailable => {
                    error!(method = %method, error = %e, "RPC call failed")
                }
                code => debug!(method = %method, %code, "RPC call rejected"),
            }
            JsonRpcResponse::error(request.id, JsonRpcError::new(e.code(), e.public_message()))
        }
    }
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let methods = state.methods.list().await.len();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "methods": methods,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::time::Duration;
    use strongbox_core::wire::metadata::{AUTHORIZATION, SECRET_KEY};

    async fn test_server() -> Server {
        test_server_with_store().await.0
    }

    async fn test_server_with_store() -> (Server, SecretStore) {
        let config = ServerConfig::default().with_jwt_key("0123456789abcdef");
        let store = SecretStore::in_memory(config.store_timeout()).await.unwrap();
        let server = Server::with_store(config, store.clone()).await.unwrap();
        (server, store)
    }

    fn body(method: &str, params: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&JsonRpcRequest::new(method).with_params(params)).unwrap()
    }

    async fn register(server: &Server) -> String {
        let resp = handle_request(
            &server.state,
            Metadata::new(),
            &body("user.register", serde_json::json!({"login": "alice", "password": "pw1"})),
        )
        .await;
        resp.result.unwrap()["token"].as_str().unwrap().to_string()
    }

    fn error_code(resp: &JsonRpcResponse) -> Code {
        resp.error.as_ref().unwrap().status()
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = test_server().await;
        let resp = handle_request(&server.state, Metadata::new(), b"{not json").await;
        assert_eq!(error_code(&resp), Code::ParseError);
        assert!(resp.id.is_none());
    }

    #[tokio::test]
    async fn test_protected_method_requires_token() {
        let server = test_server().await;

        let resp = handle_request(
            &server.state,
            Metadata::new(),
            &body("secrets.list", serde_json::json!({})),
        )
        .await;
        assert_eq!(error_code(&resp), Code::Unauthenticated);
        assert_eq!(resp.error.unwrap().message, "invalid or expired token");

        let resp = handle_request(
            &server.state,
            Metadata::new().with(AUTHORIZATION, "Bearer forged.token.value"),
            &body("secrets.list", serde_json::json!({})),
        )
        .await;
        assert_eq!(error_code(&resp), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_spoofed_userid_ignored() {
        let server = test_server().await;

        let resp = handle_request(
            &server.state,
            Metadata::new().with(USER_ID, "alice"),
            &body("secrets.list", serde_json::json!({})),
        )
        .await;
        assert_eq!(error_code(&resp), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_token_flow() {
        let server = test_server().await;
        let token = register(&server).await;

        let md = Metadata::new()
            .with(AUTHORIZATION, format!("Bearer {}", token))
            .with(SECRET_KEY, "k1");

        let resp = handle_request(
            &server.state,
            md.clone(),
            &body(
                "secrets.add",
                serde_json::json!({"secret": {"name": "note1", "type": "text", "data": "aGVsbG8="}}),
            ),
        )
        .await;
        assert!(resp.error.is_none());

        // Bare token works too, and a spoofed userid is replaced.
        let resp = handle_request(
            &server.state,
            Metadata::new()
                .with(AUTHORIZATION, token.clone())
                .with(USER_ID, "mallory"),
            &body("secrets.list", serde_json::json!({})),
        )
        .await;
        let items = &resp.result.unwrap()["items"];
        assert_eq!(items[0]["name"], "note1");
        assert_eq!(items[0]["version"], 1);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = test_server().await;
        let token = register(&server).await;

        let resp = handle_request(
            &server.state,
            Metadata::new().with(AUTHORIZATION, token),
            &body("secrets.rename", serde_json::json!({})),
        )
        .await;
        assert_eq!(error_code(&resp), Code::MethodNotFound);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let server = test_server().await;
        let resp = handle_request(
            &server.state,
            Metadata::new(),
            br#"{"jsonrpc":"1.0","id":1,"method":"user.login"}"#,
        )
        .await;
        assert_eq!(error_code(&resp), Code::InvalidRequest);
    }

    #[tokio::test]
    async fn test_missing_key_fails_startup() {
        let result = Server::new(ServerConfig::default()).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_until_shuts_down() {
        let (server, store) = test_server_with_store().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server
                .run_until(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(15), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());

        // The store pool is closed once the server has stopped.
        assert!(matches!(
            store.get_user("alice").await,
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        ));
    }
}
