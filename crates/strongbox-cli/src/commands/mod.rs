//! CLI command implementations.

pub mod init;
pub mod login;
pub mod secret;
pub mod server;

use anyhow::Context as _;
use std::path::PathBuf;
use strongbox_client::RpcClient;
use strongbox_core::{paths, ClientConfig, SecretString};

/// State shared by the client-side commands.
pub struct Context {
    config_override: Option<PathBuf>,
}

impl Context {
    pub fn new(config_override: Option<PathBuf>) -> Self {
        Self { config_override }
    }

    /// Client config file in effect.
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config_override {
            Some(path) => Ok(path.clone()),
            None => Ok(paths::client_config_file()?),
        }
    }

    /// Load the client config, using defaults when the file is absent.
    pub fn load_config(&self) -> anyhow::Result<ClientConfig> {
        let path = self.config_path()?;
        ClientConfig::load_or_default(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    pub fn save_config(&self, config: &ClientConfig) -> anyhow::Result<PathBuf> {
        let path = self.config_path()?;
        config
            .save(&path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        Ok(path)
    }

    /// Client carrying the stored session token. Missing token is an error.
    pub fn authed_client(&self, config: &ClientConfig) -> anyhow::Result<RpcClient> {
        let token = config.require_token()?.clone();
        Ok(RpcClient::new(&config.server, config.timeout())?.with_token(token))
    }
}

/// Hidden prompt that refuses empty input.
pub fn prompt_secret(prompt: &str) -> anyhow::Result<SecretString> {
    let value = rpassword::prompt_password(prompt).context("Failed to read input")?;
    if value.is_empty() {
        anyhow::bail!("Input must not be empty");
    }
    Ok(SecretString::new(value))
}
