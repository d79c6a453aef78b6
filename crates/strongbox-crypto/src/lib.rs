//! # strongbox-crypto
//!
//! Envelope encryption for secret payloads and password hashing for user
//! credentials. Pure functions with no I/O.

pub mod cipher;
pub mod error;
pub mod password;

pub use cipher::{decrypt, encrypt};
pub use error::{CryptoError, Result};
pub use password::{hash_password, verify_password};
