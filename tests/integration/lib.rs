//! Shared helpers for Strongbox integration tests.

use std::time::Duration;
use strongbox_client::RpcClient;
use strongbox_core::ServerConfig;
use strongbox_server::Server;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Signing key used by test servers.
pub const TEST_JWT_KEY: &str = "integration-test-signing-key";

/// A server on an ephemeral loopback port with an on-disk database.
pub struct TestServer {
    pub url: String,
    pub dir: TempDir,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<strongbox_server::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("server.db");

        let mut config = ServerConfig::default().with_jwt_key(TEST_JWT_KEY);
        config.address = "127.0.0.1:0".to_string();
        config.database_url = format!("sqlite://{}", db.display());
        config.shutdown_grace_secs = 2;

        let server = Server::new(config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .run_until(listener, async {
                    let _ = stopped.await;
                })
                .await
        });

        Self {
            url,
            dir,
            stop: Some(stop),
            handle,
        }
    }

    /// Unauthenticated client for this server.
    pub fn client(&self) -> RpcClient {
        RpcClient::new(&self.url, Duration::from_secs(5)).unwrap()
    }

    /// Stop the server and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}
