//! AES-256-GCM envelope encryption keyed by a caller passphrase.
//!
//! The key is the SHA-256 digest of the passphrase. This is a plain digest,
//! not a work-factor KDF: a weak passphrase is as weak as it looks. A fresh
//! random nonce is prepended to each ciphertext, so the stored layout is
//! `nonce || ciphertext || tag`.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

fn cipher_for(passphrase: &[u8]) -> Result<Aes256Gcm> {
    let key: Zeroizing<[u8; 32]> = Zeroizing::new(Sha256::digest(passphrase).into());
    Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Encrypt `plaintext` under `passphrase`.
///
/// Encrypting the same plaintext twice yields different output.
pub fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(passphrase)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt data produced by [`encrypt`] with the same passphrase.
pub fn decrypt(passphrase: &[u8], encrypted: &[u8]) -> Result<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed(
            "ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let cipher = cipher_for(passphrase)?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed("authentication failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_encrypt_decrypt() {
        let plaintext = b"hello, secret world!";

        let encrypted = encrypt(b"k1", plaintext).unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);

        let decrypted = decrypt(b"k1", &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt(b"k1", b"sensitive data").unwrap();
        let result = decrypt(b"k2", &encrypted);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut encrypted = encrypt(b"k1", b"important secret").unwrap();

        // Flip a byte in the ciphertext portion (after the nonce).
        encrypted[NONCE_SIZE + 1] ^= 0xff;

        assert!(decrypt(b"k1", &encrypted).is_err());
    }

    #[test]
    fn test_short_input_fails() {
        assert!(decrypt(b"k1", &[]).is_err());
        assert!(decrypt(b"k1", &[0u8; NONCE_SIZE + TAG_SIZE - 1]).is_err());
    }

    #[test]
    fn test_nonces_differ() {
        let a = encrypt(b"k1", b"same plaintext").unwrap();
        let b = encrypt(b"k1", b"same plaintext").unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    }

    #[test]
    fn test_empty_plaintext_and_passphrase() {
        let encrypted = encrypt(b"", b"").unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(decrypt(b"", &encrypted).unwrap(), b"");
    }
}
