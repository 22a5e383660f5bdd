//! SQLite-backed client storage.
//!
//! [`SqliteStore`] implements [`KeyValueStore`] so a headless client keeps its
//! session id, greeted flag and visited pages across runs, the way a browser
//! keeps them in local storage.
//!
//! # Example
//!
//! ```no_run
//! use engage_core::KeyValueStore;
//! use engage_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::connect("sqlite:engage.db?mode=rwc").await?;
//! store.migrate().await?;
//!
//! store.set("chatSessionId", "abc-123").await?;
//! assert_eq!(store.get("chatSessionId").await?.as_deref(), Some("abc-123"));
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{Result, StoreError};

use std::str::FromStr;

use async_trait::async_trait;
use engage_core::{EngageError, KeyValueStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Client storage in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Default pool size for store connections.
    const DEFAULT_POOL_SIZE: u32 = 4;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// In-memory databases (`sqlite::memory:`) get a single connection so
    /// every query sees the same data.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool_size = if url.contains(":memory:") {
            1
        } else {
            Self::DEFAULT_POOL_SIZE
        };
        Self::connect_with_pool_size(url, pool_size).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to store: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run store migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running store migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
            FROM client_storage
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn upsert_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_storage (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM client_storage
            WHERE key = ?
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, EngageError> {
        Ok(self.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> std::result::Result<(), EngageError> {
        Ok(self.upsert_value(key, value).await?)
    }

    async fn remove(&self, key: &str) -> std::result::Result<(), EngageError> {
        Ok(self.delete_value(key).await?)
    }
}
