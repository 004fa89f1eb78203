use crate::models::{AnalyticsRecord, UrlMapping};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS url_mappings (
                short_code TEXT PRIMARY KEY,
                original_url TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics (
                id BIGSERIAL PRIMARY KEY,
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
        let row = sqlx::query_as::<_, UrlMapping>(
            r#"
            INSERT INTO url_mappings (short_code, original_url)
            VALUES ($1, $2)
            ON CONFLICT (short_code) DO NOTHING
            RETURNING short_code, original_url
            "#,
        )
        .bind(short_code)
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        row.ok_or(StorageError::Conflict)
    }

    async fn get_mapping(&self, short_code: &str) -> Result<Option<UrlMapping>> {
        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT short_code, original_url
            FROM url_mappings
            WHERE short_code = $1
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
        let record = sqlx::query_as::<_, AnalyticsRecord>(
            r#"
            INSERT INTO analytics (short_code, timestamp, ip_address)
            VALUES ($1, $2, $3)
            RETURNING id, short_code, timestamp, ip_address
            "#,
        )
        .bind(short_code)
        .bind(timestamp)
        .bind(ip_address)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn list_visits(&self, short_code: &str) -> Result<Vec<AnalyticsRecord>> {
        let records = sqlx::query_as::<_, AnalyticsRecord>(
            r#"
            SELECT id, short_code, timestamp, ip_address
            FROM analytics
            WHERE short_code = $1
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
