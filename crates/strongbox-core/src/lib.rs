//! # strongbox-core
//!
//! Core types, wire contract, and configuration for Strongbox.
//!
//! This crate provides shared functionality used across all Strongbox crates:
//!
//! - **Types**: secrets, listing items, card records, and the closed secret kind enum
//! - **Wire**: request/response messages and the JSON-RPC envelope shared by client and server
//! - **Status codes**: the error taxonomy both sides agree on
//! - **Configuration**: server and client settings, paths, and environment handling

pub mod code;
pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod rpc;
pub mod secret;
pub mod types;
pub mod wire;

// Re-exports for convenience
pub use code::Code;
pub use config::{ClientConfig, ServerConfig};
pub use error::{ConfigError, Error, Result};
pub use secret::SecretString;
pub use types::*;
