pub mod url;

pub use url::{AnalyticsRecord, ShortenRequest, ShortenResponse, UrlMapping};
