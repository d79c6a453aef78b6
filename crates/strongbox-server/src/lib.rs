//! JSON-RPC secret server for Strongbox.
//!
//! This crate provides:
//! - Session tokens and password checks (`auth`)
//! - The per-user encrypted secret store over SQLite (`store`)
//! - RPC method handlers behind a token-checking dispatcher
//! - The HTTP server with graceful shutdown

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metadata;
pub mod methods;
pub mod server;
pub mod store;

pub use auth::{CredentialManager, TokenError};
pub use error::{ServerError, ServiceError};
pub use handlers::HandlerContext;
pub use metadata::{CallContext, Metadata};
pub use methods::{MethodHandler, MethodRegistry};
pub use server::Server;
pub use store::{SecretStore, StoreError};

/// Result type for server setup and lifecycle.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Result type for a single RPC call.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
