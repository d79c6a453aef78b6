//! Client configuration, loading and persistence.

use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the CLI client, persisted as JSON5.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL.
    pub server: String,

    /// Session token from the last login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,

    /// Envelope passphrase. Usually supplied per call instead of stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SecretString>,

    /// Local cache database; defaults to `~/.strongbox/cache.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:3200".to_string(),
            token: None,
            secret_key: None,
            cache_path: None,
            timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // json5 has no serializer; JSON is valid JSON5
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        let mut file = create_private(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Session token, or an error telling the user to log in.
    pub fn require_token(&self) -> Result<&SecretString, ConfigError> {
        self.token
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Missing("session token, run `strongbox login` first".to_string())
            })
    }

    /// Cache database path, resolving the default location.
    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => paths::cache_file(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Open `path` for writing, owner-only from the moment it exists.
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;

    // mode() only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    Ok(file)
}
