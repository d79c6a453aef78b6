//! Client error types.

use crate::cache::CacheError;
use reqwest::StatusCode;
use strongbox_core::Code;
use thiserror::Error;

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a JSON-RPC answer.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("{code}: {message}")]
    Status { code: Code, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ClientError {
    /// Status code of a server-reported error.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the server could not be reached or reported itself unavailable.
    ///
    /// Gateway failures from a proxy in front of the server count as
    /// unreachable. Only these errors justify falling back to the local cache.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.is_connect() || e.is_timeout() || e.status().is_some_and(is_gateway_failure)
            }
            Self::Status { code, .. } => *code == Code::Unavailable,
            _ => false,
        }
    }
}

fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
