use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};

use super::{StoreError, VersionRecord, VersionStore};

/// MySQL-backed version store.
///
/// The pool is cheap to clone; one instance is shared by the whole process.
#[derive(Clone)]
pub struct MySqlVersionStore {
    pool: MySqlPool,
}

impl MySqlVersionStore {
    /// Connect to the database behind `url` with a small pool — each worker
    /// process handles one message at a time, so two connections suffice.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl VersionStore for MySqlVersionStore {
    async fn fetch(&self, id: i64) -> Result<Option<VersionRecord>, StoreError> {
        let row = sqlx::query("SELECT id, size_tar FROM versions WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(|row| VersionRecord {
            id: row.get("id"),
            size_tar: row.get("size_tar"),
        }))
    }

    async fn record_tarball_size(&self, id: i64, size: i64) -> Result<bool, StoreError> {
        // Conditional update: only the first writer for a record succeeds.
        // This closes the duplicate-delivery window between the idempotency
        // check and the write.
        let result = sqlx::query(
            "UPDATE versions SET size_tar = ? \
             WHERE id = ? AND (size_tar IS NULL OR size_tar = 0)",
        )
        .bind(size)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
