//! Visit analytics
//!
//! Every successful redirect appends one `(timestamp, ip_address)` row for the
//! short code; the log is read back in the order it was written.

pub mod ip_extractor;

pub use ip_extractor::extract_client_ip;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::storage::Storage;

/// Timestamp layout stored with each visit
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One entry of the analytics response: `[timestamp, ipAddress]`
pub type VisitEntry = (String, String);

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// All visits for `short_code` in append order; empty when there are none
pub async fn visit_log(storage: &dyn Storage, short_code: &str) -> Result<Vec<VisitEntry>> {
    let records = storage.list_visits(short_code).await?;
    Ok(records
        .into_iter()
        .map(|record| (record.timestamp, record.ip_address))
        .collect())
}
