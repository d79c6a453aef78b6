//! Server configuration.

use crate::error::ConfigError;
use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Minimum signing key length in bytes.
pub const MIN_JWT_KEY_LEN: usize = 16;

/// Settings for `strongbox server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub address: String,

    /// SQLite connection URL.
    pub database_url: String,

    /// HMAC key for session tokens. No default.
    pub jwt_key: Option<SecretString>,

    /// Session token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Deadline for each store operation in seconds.
    pub store_timeout_secs: u64,

    /// Grace window for in-flight calls on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3200".to_string(),
            database_url: "sqlite://strongbox.db".to_string(),
            jwt_key: None,
            token_ttl_secs: 3600,
            store_timeout_secs: 3,
            shutdown_grace_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Set the signing key.
    pub fn with_jwt_key(mut self, key: impl Into<SecretString>) -> Self {
        self.jwt_key = Some(key.into());
        self
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Signing key, or an error when none is configured.
    pub fn signing_key(&self) -> Result<&SecretString, ConfigError> {
        self.jwt_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing("jwt_key (set STRONGBOX_JWT_KEY)".to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.address.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid listen address '{}', expected host:port",
                self.address
            ));
        }

        if self.database_url.is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        match &self.jwt_key {
            None => errors.push("Signing key is required (STRONGBOX_JWT_KEY)".to_string()),
            Some(key) if key.len() < MIN_JWT_KEY_LEN => errors.push(format!(
                "Signing key must be at least {} bytes, got {}",
                MIN_JWT_KEY_LEN,
                key.len()
            )),
            Some(_) => {}
        }

        if self.token_ttl_secs == 0 {
            errors.push("Token TTL cannot be 0".to_string());
        }

        if self.store_timeout_secs == 0 {
            errors.push("Store timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
