use anyhow::{Context, Result};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::analytics::{extract_client_ip, format_timestamp};
use crate::config::AnalyticsConfig;
use crate::storage::Storage;

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    pub analytics: AnalyticsConfig,
}

/// Result of following a short code. Not-found is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Redirect(String),
    NotFound,
}

/// Look up `short_code`; on a hit, append one visit for `client_ip` before
/// handing back the destination. A stored URL that cannot be sent as a
/// `Location` header is an error and records nothing.
pub async fn resolve(
    storage: &dyn Storage,
    short_code: &str,
    client_ip: IpAddr,
) -> Result<RedirectOutcome> {
    let Some(mapping) = storage.get_mapping(short_code).await? else {
        return Ok(RedirectOutcome::NotFound);
    };

    HeaderValue::from_str(&mapping.original_url)
        .with_context(|| format!("stored URL for '{short_code}' is not a valid Location header"))?;

    let timestamp = format_timestamp(Utc::now());
    storage
        .record_visit(short_code, &timestamp, &client_ip.to_string())
        .await?;

    Ok(RedirectOutcome::Redirect(mapping.original_url))
}

/// Redirect to original URL
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let client_ip = extract_client_ip(&headers, addr.ip(), &state.analytics);

    match resolve(state.storage.as_ref(), &code, client_ip).await {
        Ok(RedirectOutcome::Redirect(location)) => {
            tracing::debug!(short_code = %code, client_ip = %client_ip, "redirecting");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Ok(RedirectOutcome::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "redirect lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
