//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Environment variable names read by Strongbox.
pub mod vars {
    /// Base directory for client state.
    pub const HOME: &str = "STRONGBOX_HOME";

    /// Client config file override.
    pub const CONFIG: &str = "STRONGBOX_CONFIG";

    // Server settings
    pub const ADDRESS: &str = "STRONGBOX_ADDRESS";
    pub const DATABASE_URL: &str = "STRONGBOX_DATABASE_URL";
    pub const JWT_KEY: &str = "STRONGBOX_JWT_KEY";
    pub const TOKEN_TTL: &str = "STRONGBOX_TOKEN_TTL";
    pub const STORE_TIMEOUT: &str = "STRONGBOX_STORE_TIMEOUT";
    pub const SHUTDOWN_GRACE: &str = "STRONGBOX_SHUTDOWN_GRACE";

    // Client settings
    pub const SERVER: &str = "STRONGBOX_SERVER";
    pub const SECRET_KEY: &str = "STRONGBOX_SECRET_KEY";
}
