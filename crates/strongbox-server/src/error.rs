//! Server error types.

use crate::auth::TokenError;
use crate::store::StoreError;
use strongbox_core::{Code, ConfigError};
use thiserror::Error;

/// Errors from server setup and lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Credential setup error: {0}")]
    Credentials(#[from] TokenError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Serve(String),
}

/// Errors from a single RPC call.
///
/// The `Display` text of each variant is what the caller sees, except for
/// `Internal` and `Unavailable`, whose detail stays in the server log.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid or expired token")]
    Unauthenticated,

    #[error("wrong login or password")]
    PermissionDenied,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("operation timed out")]
    DeadlineExceeded,

    #[error("decryption failed: wrong secret key or corrupted data")]
    DecryptionFailed,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Status code sent to the caller.
    pub fn code(&self) -> Code {
        match self {
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::Unauthenticated => Code::Unauthenticated,
            Self::PermissionDenied => Code::PermissionDenied,
            Self::NotFound(_) => Code::NotFound,
            Self::AlreadyExists(_) => Code::AlreadyExists,
            Self::Unavailable(_) => Code::Unavailable,
            Self::DeadlineExceeded => Code::DeadlineExceeded,
            Self::DecryptionFailed => Code::DecryptionFailed,
            Self::MethodNotFound(_) => Code::MethodNotFound,
            Self::Internal(_) => Code::Internal,
        }
    }

    /// Message sent to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal error".to_string(),
            Self::Unavailable(_) => "service unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserAlreadyExists => Self::AlreadyExists("user already exists".into()),
            StoreError::UserNotFound => Self::NotFound("user not found".into()),
            StoreError::SecretAlreadyExists => {
                Self::AlreadyExists("secret already exists".into())
            }
            StoreError::SecretNotFound => Self::NotFound("secret not found".into()),
            StoreError::NoSecrets => Self::NotFound("no secrets".into()),
            StoreError::DeadlineExceeded => Self::DeadlineExceeded,
            err if err.is_unavailable() => Self::Unavailable(err.to_string()),
            err => Self::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("response encoding failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let cases = [
            (StoreError::UserAlreadyExists, Code::AlreadyExists),
            (StoreError::UserNotFound, Code::NotFound),
            (StoreError::SecretAlreadyExists, Code::AlreadyExists),
            (StoreError::SecretNotFound, Code::NotFound),
            (StoreError::DeadlineExceeded, Code::DeadlineExceeded),
            (
                StoreError::Database(sqlx::Error::PoolTimedOut),
                Code::Unavailable,
            ),
            (StoreError::Migration("bad".into()), Code::Internal),
        ];
        for (err, code) in cases {
            assert_eq!(ServiceError::from(err).code(), code);
        }
    }

    #[test]
    fn test_internal_detail_not_public() {
        let err = ServiceError::Internal("disk /var/lib/x is full".into());
        assert_eq!(err.public_message(), "internal error");
        assert!(err.to_string().contains("disk"));

        let err = ServiceError::Unavailable("connection refused".into());
        assert!(!err.public_message().contains("refused"));
    }

    #[test]
    fn test_unauthenticated_message() {
        assert_eq!(
            ServiceError::Unauthenticated.public_message(),
            "invalid or expired token"
        );
    }
}
