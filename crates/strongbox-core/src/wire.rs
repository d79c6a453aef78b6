//! Wire contract between client and server.
//!
//! Request and response bodies for each RPC method, the method names, and
//! the call metadata keys carried as HTTP headers.

use crate::secret::SecretString;
use crate::types::{Secret, SecretItem};
use serde::{Deserialize, Serialize};

/// RPC method names.
pub mod methods {
    pub const REGISTER: &str = "user.register";
    pub const LOGIN: &str = "user.login";
    pub const LIST_SECRETS: &str = "secrets.list";
    pub const ADD_SECRET: &str = "secrets.add";
    pub const UPDATE_SECRET: &str = "secrets.update";
    pub const GET_SECRET: &str = "secrets.get";
    pub const DELETE_SECRET: &str = "secrets.delete";

    /// Methods callable without a session token.
    pub const PUBLIC: [&str; 2] = [REGISTER, LOGIN];
}

/// Call metadata keys.
pub mod metadata {
    /// Session token, bare or as `Bearer <token>`.
    pub const AUTHORIZATION: &str = "authorization";
    /// Envelope passphrase for secret payloads.
    pub const SECRET_KEY: &str = "secretkey";
    /// Authenticated user. Set by the server only; inbound values are dropped.
    pub const USER_ID: &str = "userid";
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: SecretString,
}

impl User {
    pub fn new(login: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Session token returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAuthToken {
    pub token: SecretString,
}

/// Empty request or response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSecretsResponse {
    #[serde(default)]
    pub items: Vec<SecretItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSecretRequest {
    pub secret: Secret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSecretRequest {
    pub secret: Secret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSecretResponse {
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSecretRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSecretResponse {
    pub secret: Secret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSecretRequest {
    #[serde(default)]
    pub name: String,
}

/// Serde adapter encoding `Vec<u8>` as standard base64.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
