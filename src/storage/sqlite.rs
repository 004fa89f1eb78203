use crate::models::{AnalyticsRecord, UrlMapping};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS url_mappings (
                short_code TEXT PRIMARY KEY NOT NULL,
                original_url TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        // short_code is not a foreign key into url_mappings
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                ip_address TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_analytics_short_code ON analytics(short_code)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert_mapping(
        &self,
        short_code: &str,
        original_url: &str,
    ) -> StorageResult<UrlMapping> {
        let result = sqlx::query(
            r#"
            INSERT INTO url_mappings (short_code, original_url)
            VALUES (?, ?)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(short_code)
        .bind(original_url)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(UrlMapping {
            short_code: short_code.to_string(),
            original_url: original_url.to_string(),
        })
    }

    async fn get_mapping(&self, short_code: &str) -> Result<Option<UrlMapping>> {
        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT short_code, original_url
            FROM url_mappings
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn record_visit(
        &self,
        short_code: &str,
        timestamp: &str,
        ip_address: &str,
    ) -> Result<AnalyticsRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO analytics (short_code, timestamp, ip_address)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(short_code)
        .bind(timestamp)
        .bind(ip_address)
        .execute(self.pool.as_ref())
        .await?;

        Ok(AnalyticsRecord {
            id: result.last_insert_rowid(),
            short_code: short_code.to_string(),
            timestamp: timestamp.to_string(),
            ip_address: ip_address.to_string(),
        })
    }

    async fn list_visits(&self, short_code: &str) -> Result<Vec<AnalyticsRecord>> {
        let records = sqlx::query_as::<_, AnalyticsRecord>(
            r#"
            SELECT id, short_code, timestamp, ip_address
            FROM analytics
            WHERE short_code = ?
            ORDER BY id ASC
            "#,
        )
        .bind(short_code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn count_mappings(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM url_mappings")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
