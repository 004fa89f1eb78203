use crate::models::{AnalyticsRecord, UrlMapping};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new mapping. Fails with `StorageError::Conflict` when the code is taken.
    async fn insert_mapping(&self, short_code: &str, original_url: &str)
        -> StorageResult<UrlMapping>;

    /// Get a mapping by short code
    async fn get_mapping(&self, short_code: &str) -> Result<Option<UrlMapping>>;

    /// Append one visit to the analytics log
    async fn record_visit(
        &self,
        short_code: &str,
        timestamp: &str,
        ip_address: &str,
    ) -> Result<AnalyticsRecord>;

    /// All visits for a short code, oldest first
    async fn list_visits(&self, short_code: &str) -> Result<Vec<AnalyticsRecord>>;

    /// Number of stored mappings
    async fn count_mappings(&self) -> Result<i64>;
}
