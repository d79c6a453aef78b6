//! Per-user secret store over SQLite via sqlx.
//!
//! Secrets reaching this layer already hold ciphertext in `data`. Every
//! query that touches `secrets` is scoped by `userid`, and every operation
//! runs under the configured deadline.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use strongbox_core::{Secret, SecretItem, SecretKind};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the secret store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Secret already exists")]
    SecretAlreadyExists,

    #[error("Secret not found")]
    SecretNotFound,

    #[error("No secrets stored")]
    NoSecrets,

    #[error("Store operation exceeded its deadline")]
    DeadlineExceeded,
}

impl StoreError {
    /// Whether the datastore itself could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A registered user as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredUser {
    pub user_id: String,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct SecretRow {
    name: String,
    kind: String,
    meta: String,
    data: Vec<u8>,
    version: i64,
}

impl From<SecretRow> for Secret {
    fn from(row: SecretRow) -> Self {
        Secret {
            name: row.name,
            kind: SecretKind::from_wire(&row.kind),
            meta: row.meta,
            data: row.data,
            version: row.version,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    name: String,
    kind: String,
    version: i64,
}

/// Server-side secret store. Cheap to clone (the pool is shared).
#[derive(Clone)]
pub struct SecretStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SecretStore {
    /// Open (or create) the database at `url` and run pending migrations.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(timeout)
            .connect_with(opts)
            .await?;

        Self::with_pool(pool, timeout).await
    }

    /// Private in-memory database, used by tests.
    pub async fn in_memory(timeout: Duration) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // One connection that never recycles, otherwise the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(timeout)
            .connect_with(opts)
            .await?;

        Self::with_pool(pool, timeout).await
    }

    async fn with_pool(pool: SqlitePool, timeout: Duration) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(Self { pool, timeout })
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout = ?self.timeout, "Store operation exceeded deadline");
                Err(StoreError::DeadlineExceeded)
            }
        }
    }

    // ── Users ────────────────────────────────────────────────────────────────

    /// Register a user. Fails with `UserAlreadyExists` on a duplicate id.
    pub async fn add_user(&self, user_id: &str, password_hash: &str) -> Result<()> {
        self.bounded("add_user", async {
            sqlx::query("INSERT INTO users (userid, password) VALUES (?, ?)")
                .bind(user_id)
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map_err(|e| on_unique_violation(e, StoreError::UserAlreadyExists))?;
            debug!(user_id, "User added");
            Ok::<_, StoreError>(())
        })
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<StoredUser> {
        self.bounded("get_user", async {
            sqlx::query_as::<_, StoredUser>(
                "SELECT userid AS user_id, password AS password_hash FROM users WHERE userid = ?",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::UserNotFound)
        })
        .await
    }

    // ── Secrets ──────────────────────────────────────────────────────────────

    /// Insert a new secret at version 1. The incoming version is ignored.
    pub async fn add(&self, user_id: &str, secret: &Secret) -> Result<()> {
        self.bounded("add", async {
            sqlx::query(
                "INSERT INTO secrets (userid, name, type, meta, data, version) \
                 VALUES (?, ?, ?, ?, ?, 1)",
            )
            .bind(user_id)
            .bind(&secret.name)
            .bind(secret.kind.as_str())
            .bind(&secret.meta)
            .bind(&secret.data)
            .execute(&self.pool)
            .await
            .map_err(|e| on_unique_violation(e, StoreError::SecretAlreadyExists))?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    /// Replace kind, meta and data, bumping the version by one.
    ///
    /// Returns the new version. Concurrent updates serialize on the single
    /// statement, so each one observes a distinct version.
    pub async fn update(&self, user_id: &str, secret: &Secret) -> Result<i64> {
        self.bounded("update", async {
            sqlx::query_scalar::<_, i64>(
                "UPDATE secrets SET version = version + 1, type = ?, meta = ?, data = ? \
                 WHERE userid = ? AND name = ? RETURNING version",
            )
            .bind(secret.kind.as_str())
            .bind(&secret.meta)
            .bind(&secret.data)
            .bind(user_id)
            .bind(&secret.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::SecretNotFound)
        })
        .await
    }

    pub async fn get(&self, user_id: &str, name: &str) -> Result<Secret> {
        self.bounded("get", async {
            sqlx::query_as::<_, SecretRow>(
                "SELECT name, type AS kind, meta, data, version FROM secrets \
                 WHERE userid = ? AND name = ?",
            )
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Secret::from)
            .ok_or(StoreError::SecretNotFound)
        })
        .await
    }

    pub async fn delete(&self, user_id: &str, name: &str) -> Result<()> {
        self.bounded("delete", async {
            let result = sqlx::query("DELETE FROM secrets WHERE userid = ? AND name = ?")
                .bind(user_id)
                .bind(name)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::SecretNotFound);
            }
            Ok(())
        })
        .await
    }

    /// List a user's secrets ordered by name. Fails with `NoSecrets` when empty.
    pub async fn list(&self, user_id: &str) -> Result<Vec<SecretItem>> {
        self.bounded("list", async {
            let rows = sqlx::query_as::<_, ItemRow>(
                "SELECT name, type AS kind, version FROM secrets WHERE userid = ? ORDER BY name",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            if rows.is_empty() {
                return Err(StoreError::NoSecrets);
            }

            Ok(rows
                .into_iter()
                .map(|row| SecretItem {
                    name: row.name,
                    kind: SecretKind::from_wire(&row.kind),
                    version: row.version,
                })
                .collect())
        })
        .await
    }
}

fn on_unique_violation(err: sqlx::Error, conflict: StoreError) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return conflict;
        }
    }
    StoreError::Database(err)
}
