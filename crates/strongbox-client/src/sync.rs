//! Synchronizing the local cache with the server.
//!
//! One pass diffs versions: names missing locally are fetched and inserted,
//! names whose local version is behind are fetched and overwritten, and
//! local names the server no longer has are deleted. The pull phase runs in
//! name order; the prune phase only runs once every pull has succeeded.
//!
//! A pass is not transactional. If it fails halfway the cache holds whatever
//! was applied so far, and the next pass picks up from there.

use crate::cache::SecretCache;
use crate::error::ClientError;
use crate::remote::RemoteSecrets;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// What a sync pass changed in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Names fetched and inserted.
    pub added: Vec<String>,
    /// Names fetched and overwritten.
    pub updated: Vec<String>,
    /// Names deleted locally.
    pub removed: Vec<String>,
    /// Names already at the server's version.
    pub unchanged: usize,
}

impl SyncReport {
    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} removed, {} unchanged",
            self.added.len(),
            self.updated.len(),
            self.removed.len(),
            self.unchanged
        )
    }
}

/// A sync pass that stopped early. `report` holds what was applied.
#[derive(Debug, Error)]
#[error("sync {stage} failed after {report}: {source}")]
pub struct SyncError {
    pub stage: SyncStage,
    pub report: SyncReport,
    #[source]
    pub source: ClientError,
}

/// Where a sync pass failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStage {
    ListRemote,
    ListLocal,
    Pull(String),
    Prune(String),
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::ListRemote => f.write_str("listing remote secrets"),
            SyncStage::ListLocal => f.write_str("listing cached secrets"),
            SyncStage::Pull(name) => write!(f, "pulling '{}'", name),
            SyncStage::Prune(name) => write!(f, "removing '{}'", name),
        }
    }
}

/// Runs sync passes from a remote store into a cache.
pub struct Synchronizer<'a, R: RemoteSecrets + ?Sized> {
    remote: &'a R,
    cache: &'a SecretCache,
}

impl<'a, R: RemoteSecrets + ?Sized> Synchronizer<'a, R> {
    pub fn new(remote: &'a R, cache: &'a SecretCache) -> Self {
        Self { remote, cache }
    }

    /// Run one pass.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let remote: BTreeMap<String, i64> = match self.remote.list_secrets().await {
            Ok(items) => items.into_iter().map(|i| (i.name, i.version)).collect(),
            Err(e) => return Err(fail(SyncStage::ListRemote, report, e)),
        };
        let local: HashMap<String, i64> = match self.cache.list().await {
            Ok(items) => items.into_iter().map(|i| (i.name, i.version)).collect(),
            Err(e) => return Err(fail(SyncStage::ListLocal, report, e.into())),
        };

        debug!(remote = remote.len(), local = local.len(), "Sync pass started");

        for (name, &remote_version) in &remote {
            let local_version = local.get(name).copied();
            if matches!(local_version, Some(v) if v >= remote_version) {
                report.unchanged += 1;
                continue;
            }

            if let Err(e) = self.pull(name, local_version.is_some()).await {
                return Err(fail(SyncStage::Pull(name.clone()), report, e));
            }

            if local_version.is_some() {
                report.updated.push(name.clone());
            } else {
                report.added.push(name.clone());
            }
        }

        let mut stale: Vec<&String> = local.keys().filter(|n| !remote.contains_key(*n)).collect();
        stale.sort();
        for name in stale {
            if let Err(e) = self.cache.delete(name).await {
                return Err(fail(SyncStage::Prune(name.clone()), report, e.into()));
            }
            report.removed.push(name.clone());
        }

        info!(%report, "Sync pass complete");
        Ok(report)
    }

    async fn pull(&self, name: &str, exists_locally: bool) -> Result<(), ClientError> {
        let secret = self.remote.get_secret(name).await?;
        if exists_locally {
            self.cache.update(&secret).await?;
        } else {
            self.cache.add(&secret).await?;
        }
        Ok(())
    }
}

fn fail(stage: SyncStage, report: SyncReport, source: ClientError) -> SyncError {
    SyncError {
        stage,
        report,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use strongbox_core::{Code, Secret, SecretItem, SecretKind};

    /// In-process remote holding plaintext secrets.
    #[derive(Default)]
    struct FakeRemote {
        secrets: Mutex<BTreeMap<String, Secret>>,
        fail_get: Mutex<Option<String>>,
    }

    impl FakeRemote {
        fn put(&self, name: &str, data: &str, version: i64) {
            let secret = Secret::new(name, SecretKind::Text, data.as_bytes().to_vec())
                .with_version(version);
            self.secrets.lock().unwrap().insert(name.to_string(), secret);
        }

        fn remove(&self, name: &str) {
            self.secrets.lock().unwrap().remove(name);
        }
    }

    #[async_trait]
    impl RemoteSecrets for FakeRemote {
        async fn list_secrets(&self) -> crate::Result<Vec<SecretItem>> {
            Ok(self.secrets.lock().unwrap().values().map(Secret::item).collect())
        }

        async fn get_secret(&self, name: &str) -> crate::Result<Secret> {
            if self.fail_get.lock().unwrap().as_deref() == Some(name) {
                return Err(ClientError::Status {
                    code: Code::Unavailable,
                    message: "down".into(),
                });
            }
            self.secrets
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| ClientError::Status {
                    code: Code::NotFound,
                    message: "secret not found".into(),
                })
        }
    }

    async fn assert_converged(remote: &FakeRemote, cache: &SecretCache) {
        let remote_items = remote.list_secrets().await.unwrap();
        assert_eq!(cache.list().await.unwrap(), remote_items);
        for item in remote_items {
            let expected = remote.get_secret(&item.name).await.unwrap();
            assert_eq!(cache.get(&item.name).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_sync_pulls_missing_and_stale() {
        let remote = FakeRemote::default();
        remote.put("a", "a1", 1);
        remote.put("b", "b3", 3);
        remote.put("c", "c1", 1);

        let cache = SecretCache::in_memory().await.unwrap();
        cache
            .add(&Secret::new("b", SecretKind::Text, b"b1".to_vec()).with_version(1))
            .await
            .unwrap();
        cache
            .add(&Secret::new("c", SecretKind::Text, b"c1".to_vec()).with_version(1))
            .await
            .unwrap();

        let report = Synchronizer::new(&remote, &cache).run().await.unwrap();
        assert_eq!(report.added, ["a"]);
        assert_eq!(report.updated, ["b"]);
        assert_eq!(report.unchanged, 1);
        assert!(report.removed.is_empty());

        assert_converged(&remote, &cache).await;
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let remote = FakeRemote::default();
        remote.put("a", "a1", 1);
        remote.put("b", "b2", 2);
        let cache = SecretCache::in_memory().await.unwrap();

        let sync = Synchronizer::new(&remote, &cache);
        let first = sync.run().await.unwrap();
        assert_eq!(first.added.len(), 2);

        let second = sync.run().await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.unchanged, 2);
        assert_converged(&remote, &cache).await;
    }

    #[tokio::test]
    async fn test_sync_removes_deleted() {
        let remote = FakeRemote::default();
        remote.put("a", "a1", 1);
        remote.put("b", "b1", 1);
        let cache = SecretCache::in_memory().await.unwrap();
        Synchronizer::new(&remote, &cache).run().await.unwrap();

        remote.remove("a");
        let report = Synchronizer::new(&remote, &cache).run().await.unwrap();
        assert_eq!(report.removed, ["a"]);
        assert!(matches!(
            cache.get("a").await,
            Err(crate::CacheError::NotFound(_))
        ));
        assert_converged(&remote, &cache).await;
    }

    #[tokio::test]
    async fn test_sync_empty_remote_clears_cache() {
        let remote = FakeRemote::default();
        let cache = SecretCache::in_memory().await.unwrap();
        cache
            .add(&Secret::new("old", SecretKind::Text, Vec::new()).with_version(4))
            .await
            .unwrap();

        let report = Synchronizer::new(&remote, &cache).run().await.unwrap();
        assert_eq!(report.removed, ["old"]);
        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_pull_reports_partial_and_skips_prune() {
        let remote = FakeRemote::default();
        remote.put("a", "a1", 1);
        remote.put("b", "b1", 1);
        remote.put("c", "c1", 1);
        *remote.fail_get.lock().unwrap() = Some("b".to_string());

        let cache = SecretCache::in_memory().await.unwrap();
        cache
            .add(&Secret::new("zombie", SecretKind::Text, Vec::new()).with_version(1))
            .await
            .unwrap();

        let err = Synchronizer::new(&remote, &cache).run().await.unwrap_err();
        assert_eq!(err.stage, SyncStage::Pull("b".to_string()));
        assert_eq!(err.report.added, ["a"]);
        assert!(err.report.removed.is_empty());
        assert!(err.source.is_unavailable());

        // Nothing pruned after the failure.
        assert!(cache.get("zombie").await.is_ok());

        // Recovery converges.
        *remote.fail_get.lock().unwrap() = None;
        let report = Synchronizer::new(&remote, &cache).run().await.unwrap();
        assert_eq!(report.added, ["b", "c"]);
        assert_eq!(report.removed, ["zombie"]);
        assert_converged(&remote, &cache).await;
    }

    #[tokio::test]
    async fn test_newer_local_version_left_alone() {
        let remote = FakeRemote::default();
        remote.put("a", "remote", 2);
        let cache = SecretCache::in_memory().await.unwrap();
        cache
            .add(&Secret::new("a", SecretKind::Text, b"local".to_vec()).with_version(5))
            .await
            .unwrap();

        let report = Synchronizer::new(&remote, &cache).run().await.unwrap();
        assert!(report.is_noop());
        assert_eq!(cache.get("a").await.unwrap().data, b"local");
    }
}
