//! Secret records.

use super::SecretKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named secret with its payload.
///
/// On the wire `data` is plaintext base64; the server encrypts it before it
/// reaches storage. `version` is assigned by the server and ignored on add.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: SecretKind,

    #[serde(default)]
    pub meta: String,

    #[serde(with = "crate::wire::base64_bytes", default)]
    pub data: Vec<u8>,

    #[serde(default)]
    pub version: i64,
}

impl Secret {
    /// Create a secret with version 0 (not yet stored).
    pub fn new(name: impl Into<String>, kind: SecretKind, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind,
            meta: String::new(),
            data: data.into(),
            version: 0,
        }
    }

    /// Set the metadata string.
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Listing projection of this secret.
    pub fn item(&self) -> SecretItem {
        SecretItem {
            name: self.name.clone(),
            kind: self.kind,
            version: self.version,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("meta", &self.meta)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .field("version", &self.version)
            .finish()
    }
}

/// Listing entry: a secret without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretItem {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: SecretKind,

    pub version: i64,
}
