//! Server command.

use clap::Args;
use strongbox_core::env::vars;
use strongbox_core::ServerConfig;
use strongbox_server::Server;
use tracing::info;

/// Server command arguments. Unset flags keep the built-in defaults.
#[derive(Args)]
pub struct ServerArgs {
    /// Listen address
    #[arg(short, long, env = vars::ADDRESS)]
    pub address: Option<String>,

    /// SQLite connection URL
    #[arg(long, env = vars::DATABASE_URL)]
    pub database_url: Option<String>,

    /// Session token signing key (at least 16 bytes)
    #[arg(long, env = vars::JWT_KEY, hide_env_values = true)]
    pub jwt_key: Option<String>,

    /// Session token lifetime in seconds
    #[arg(long, env = vars::TOKEN_TTL)]
    pub token_ttl: Option<u64>,

    /// Deadline for each store operation in seconds
    #[arg(long, env = vars::STORE_TIMEOUT)]
    pub store_timeout: Option<u64>,

    /// Grace window for in-flight calls on shutdown, in seconds
    #[arg(long, env = vars::SHUTDOWN_GRACE)]
    pub shutdown_grace: Option<u64>,
}

impl ServerArgs {
    /// Overlay the flags on the default configuration.
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(key) = self.jwt_key {
            config = config.with_jwt_key(key);
        }
        if let Some(ttl) = self.token_ttl {
            config.token_ttl_secs = ttl;
        }
        if let Some(timeout) = self.store_timeout {
            config.store_timeout_secs = timeout;
        }
        if let Some(grace) = self.shutdown_grace {
            config.shutdown_grace_secs = grace;
        }
        config
    }
}

/// Run the server command.
pub async fn run(args: ServerArgs) -> anyhow::Result<()> {
    let config = args.into_config();
    info!(
        address = %config.address,
        database = %config.database_url,
        "Starting server"
    );

    let server = Server::new(config).await?;
    server.run().await?;
    Ok(())
}
