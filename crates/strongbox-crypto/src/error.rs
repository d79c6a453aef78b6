//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from encryption and password hashing.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong passphrase, tampered or truncated ciphertext.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Convenience result alias for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
