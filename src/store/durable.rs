use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::error::{AppError, AppResult};
use crate::store::StoreName;

/// The asynchronous durable backend: one SQLite table of collection blobs,
/// keyed by (store, key). Larger capacity and survives fast-store loss; every
/// access goes through the lazily opened shared pool.
#[derive(Debug)]
pub struct DurableStore {
    config: StoreConfig,
    pool: OnceCell<Pool<Sqlite>>,
}

impl DurableStore {
    pub fn new(config: StoreConfig) -> Self {
        DurableStore {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Lazy, memoized open: concurrent callers share one initialization, the
    /// schema-ensure step runs exactly once per process.
    async fn pool(&self) -> AppResult<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async { open_pool(&self.config).await })
            .await
    }

    pub async fn put(&self, store: StoreName, key: &str, value: &str) -> AppResult<()> {
        let pool = self.pool().await?;
        sqlx::query(
            "INSERT INTO blobs (store, key, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(store, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(store.as_str())
        .bind(key)
        .bind(value)
        .bind(crate::time::now_ms())
        .execute(pool)
        .await
        .map_err(|err| {
            AppError::from(err)
                .with_context("operation", "put")
                .with_context("store", store.as_str())
        })?;
        Ok(())
    }

    pub async fn get(&self, store: StoreName, key: &str) -> AppResult<Option<String>> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT value FROM blobs WHERE store = ? AND key = ?")
            .bind(store.as_str())
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "get")
                    .with_context("store", store.as_str())
            })?;
        match row {
            Some(row) => {
                let value: String = row.try_get("value").map_err(AppError::from)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn delete(&self, store: StoreName, key: &str) -> AppResult<()> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM blobs WHERE store = ? AND key = ?")
            .bind(store.as_str())
            .bind(key)
            .execute(pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "delete")
                    .with_context("store", store.as_str())
            })?;
        Ok(())
    }

    pub async fn read_all(&self, store: StoreName) -> AppResult<Vec<String>> {
        let pool = self.pool().await?;
        let rows = sqlx::query("SELECT value FROM blobs WHERE store = ? ORDER BY key")
            .bind(store.as_str())
            .fetch_all(pool)
            .await
            .map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "read_all")
                    .with_context("store", store.as_str())
            })?;
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            values.push(row.try_get("value").map_err(AppError::from)?);
        }
        Ok(values)
    }
}

async fn open_pool(config: &StoreConfig) -> AppResult<Pool<Sqlite>> {
    let pool = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    AppError::from(err)
                        .with_context("operation", "create_data_dir")
                        .with_context("path", parent.display().to_string())
                })?;
            }
            let path_str = path.to_str().ok_or_else(|| {
                AppError::new("STORAGE/OPEN", "database path is not valid UTF-8")
                    .with_context("path", path.display().to_string())
            })?;
            let opts = SqliteConnectOptions::from_str(path_str)
                .map_err(|err| AppError::from(err).with_context("operation", "parse_db_path"))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Full);
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(opts)
                .await
                .map_err(|err| AppError::from(err).with_context("operation", "open_pool"))?
        }
        // A memory database lives inside its single connection.
        None => SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|err| AppError::from(err).with_context("operation", "open_memory_pool"))?,
    };

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blobs (
            store TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (store, key)
        )",
    )
    .execute(&pool)
    .await
    .map_err(|err| AppError::from(err).with_context("operation", "ensure_schema"))?;

    tracing::info!(
        target: "absentia",
        event = "durable_store_open",
        in_memory = config.db_path.is_none(),
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() -> anyhow::Result<()> {
        let store = DurableStore::new(StoreConfig::in_memory());
        assert_eq!(store.get(StoreName::History, "records").await?, None);

        store.put(StoreName::History, "records", "{}").await?;
        assert_eq!(
            store.get(StoreName::History, "records").await?.as_deref(),
            Some("{}")
        );

        store.put(StoreName::History, "records", "{\"a\":[]}").await?;
        assert_eq!(
            store.get(StoreName::History, "records").await?.as_deref(),
            Some("{\"a\":[]}")
        );

        store.delete(StoreName::History, "records").await?;
        assert_eq!(store.get(StoreName::History, "records").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn read_all_scopes_by_store() -> anyhow::Result<()> {
        let store = DurableStore::new(StoreConfig::in_memory());
        store.put(StoreName::Plans, "plans", "1").await?;
        store.put(StoreName::Drafts, "drafts", "2").await?;
        assert_eq!(store.read_all(StoreName::Plans).await?, vec!["1"]);
        Ok(())
    }
}
