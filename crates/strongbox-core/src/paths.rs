//! Path resolution utilities.

use crate::env::{self, vars};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Strongbox base directory (`~/.strongbox`, or `$STRONGBOX_HOME`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(vars::HOME) {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".strongbox"))
}

/// Get the client config file path (`~/.strongbox/client.json5`).
pub fn client_config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("client.json5"))
}

/// Get the local cache database path (`~/.strongbox/cache.db`).
pub fn cache_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("cache.db"))
}
