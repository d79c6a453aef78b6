//! Status code taxonomy shared by server and client.
//!
//! Every failure that crosses the wire carries one of these codes. The
//! numeric values live in the JSON-RPC error `code` field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outward status of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    Unavailable,
    DeadlineExceeded,
    DecryptionFailed,
    Internal,
    MethodNotFound,
    InvalidRequest,
    ParseError,
}

impl Code {
    /// Every code, in declaration order.
    pub const ALL: [Code; 12] = [
        Code::InvalidArgument,
        Code::Unauthenticated,
        Code::PermissionDenied,
        Code::NotFound,
        Code::AlreadyExists,
        Code::Unavailable,
        Code::DeadlineExceeded,
        Code::DecryptionFailed,
        Code::Internal,
        Code::MethodNotFound,
        Code::InvalidRequest,
        Code::ParseError,
    ];

    /// JSON-RPC error number for this code. Standard JSON-RPC numbers where
    /// one exists, the -32000 server range otherwise.
    pub fn rpc_code(self) -> i32 {
        match self {
            Code::InvalidArgument => -32602,
            Code::Unauthenticated => -32001,
            Code::PermissionDenied => -32003,
            Code::NotFound => -32004,
            Code::AlreadyExists => -32005,
            Code::Unavailable => -32006,
            Code::DeadlineExceeded => -32007,
            Code::DecryptionFailed => -32008,
            Code::Internal => -32603,
            Code::MethodNotFound => -32601,
            Code::InvalidRequest => -32600,
            Code::ParseError => -32700,
        }
    }

    /// Decode a JSON-RPC error number. Unknown numbers are `Internal`.
    pub fn from_rpc_code(n: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|code| code.rpc_code() == n)
            .unwrap_or(Code::Internal)
    }

    /// Stable lowercase name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Code::InvalidArgument => "invalid_argument",
            Code::Unauthenticated => "unauthenticated",
            Code::PermissionDenied => "permission_denied",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::Unavailable => "unavailable",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::DecryptionFailed => "decryption_failed",
            Code::Internal => "internal",
            Code::MethodNotFound => "method_not_found",
            Code::InvalidRequest => "invalid_request",
            Code::ParseError => "parse_error",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
