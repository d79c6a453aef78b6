//! Reads that fall back to the local cache when the server is unreachable.

use crate::cache::SecretCache;
use crate::error::Result;
use crate::remote::RemoteSecrets;
use std::path::PathBuf;
use strongbox_core::{Secret, SecretItem};
use tracing::warn;

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Cache,
}

/// A value and its origin.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
}

/// Serves `get` and `list` from the cache when, and only when, the remote
/// call failed with an availability error.
pub struct OfflineFallback {
    cache_path: PathBuf,
}

impl OfflineFallback {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
        }
    }

    pub async fn get<R: RemoteSecrets + ?Sized>(
        &self,
        remote: &R,
        name: &str,
    ) -> Result<Fetched<Secret>> {
        match remote.get_secret(name).await {
            Ok(secret) => Ok(Fetched {
                value: secret,
                source: Source::Remote,
            }),
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "Server unavailable, reading secret from local cache");
                let cache = SecretCache::open(&self.cache_path).await?;
                Ok(Fetched {
                    value: cache.get(name).await?,
                    source: Source::Cache,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list<R: RemoteSecrets + ?Sized>(&self, remote: &R) -> Result<Fetched<Vec<SecretItem>>> {
        match remote.list_secrets().await {
            Ok(items) => Ok(Fetched {
                value: items,
                source: Source::Remote,
            }),
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "Server unavailable, listing secrets from local cache");
                let cache = SecretCache::open(&self.cache_path).await?;
                Ok(Fetched {
                    value: cache.list().await?,
                    source: Source::Cache,
                })
            }
            Err(e) => Err(e),
        }
    }
}
