//! Local secret cache over SQLite via sqlx.
//!
//! Holds plaintext copies of the user's secrets with the server version
//! they were fetched at. Entries are disposable: the server is the source of
//! truth and the cache is only read when it is unreachable.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strongbox_core::{Secret, SecretItem, SecretKind};
use thiserror::Error;

/// Errors from the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local cache not initialised at {0}, run `strongbox init`")]
    NotInitialised(PathBuf),

    #[error("Secret not found in local cache: {0}")]
    NotFound(String),

    #[error("Secret already cached: {0}")]
    AlreadyExists(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(sqlx::FromRow)]
struct SecretRow {
    name: String,
    kind: String,
    meta: String,
    data: Vec<u8>,
    version: i64,
}

/// Local cache handle. Cheap to clone.
#[derive(Clone)]
pub struct SecretCache {
    pool: SqlitePool,
}

impl SecretCache {
    /// Create the cache database if needed and run migrations.
    pub async fn init(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(opts, None).await
    }

    /// Open an existing cache; fails if `init` never ran.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CacheError::NotInitialised(path.to_path_buf()));
        }
        let opts = SqliteConnectOptions::new().filename(path);
        Self::connect(opts, None).await
    }

    /// Private in-memory cache, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(opts, Some(1)).await
    }

    async fn connect(opts: SqliteConnectOptions, max_connections: Option<u32>) -> Result<Self> {
        let mut pool_opts = SqlitePoolOptions::new();
        if let Some(max) = max_connections {
            pool_opts = pool_opts
                .max_connections(max)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| CacheError::Migration(e.to_string()))?;

        Ok(Self { pool })
    }

    /// All cached secrets ordered by name. Empty when nothing is cached.
    pub async fn list(&self) -> Result<Vec<SecretItem>> {
        let rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT name, type, version FROM secrets ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(name, kind, version)| SecretItem {
                name,
                kind: SecretKind::from_wire(&kind),
                version,
            })
            .collect())
    }

    pub async fn get(&self, name: &str) -> Result<Secret> {
        sqlx::query_as::<_, SecretRow>(
            "SELECT name, type AS kind, meta, data, version FROM secrets WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| Secret {
            name: row.name,
            kind: SecretKind::from_wire(&row.kind),
            meta: row.meta,
            data: row.data,
            version: row.version,
        })
        .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }

    /// Insert a secret, keeping its version.
    pub async fn add(&self, secret: &Secret) -> Result<()> {
        sqlx::query("INSERT INTO secrets (name, type, meta, data, version) VALUES (?, ?, ?, ?, ?)")
            .bind(&secret.name)
            .bind(secret.kind.as_str())
            .bind(&secret.meta)
            .bind(&secret.data)
            .bind(secret.version)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return CacheError::AlreadyExists(secret.name.clone());
                    }
                }
                CacheError::Database(e)
            })?;
        Ok(())
    }

    /// Overwrite a cached secret, including its version.
    pub async fn update(&self, secret: &Secret) -> Result<()> {
        let result =
            sqlx::query("UPDATE secrets SET type = ?, meta = ?, data = ?, version = ? WHERE name = ?")
                .bind(secret.kind.as_str())
                .bind(&secret.meta)
                .bind(&secret.data)
                .bind(secret.version)
                .bind(&secret.name)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::NotFound(secret.name.clone()));
        }
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM secrets WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::NotFound(name.to_string()));
        }
        Ok(())
    }

    /// Drop every cached secret.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM secrets").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
