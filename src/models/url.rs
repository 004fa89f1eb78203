use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored short code → original URL assignment. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UrlMapping {
    pub short_code: String,
    pub original_url: String,
}

/// One redirect event, appended to the analytics log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AnalyticsRecord {
    pub id: i64,
    pub short_code: String,
    pub timestamp: String,
    pub ip_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub original_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
}
