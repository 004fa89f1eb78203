use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{ShortenRequest, ShortenResponse};
use crate::shortcode::{AssignError, CodeAssigner};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub assigner: CodeAssigner,
    pub config: Arc<Config>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Shorten a URL
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let original_url = payload.original_url.as_str();
    if original_url.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "originalUrl cannot be empty".to_string(),
            }),
        ));
    }

    // The URL is later sent back verbatim as a Location header
    if HeaderValue::from_str(original_url).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "originalUrl contains characters not allowed in a URL".to_string(),
            }),
        ));
    }

    match state.assigner.assign(original_url).await {
        Ok(code) => Ok(Json(ShortenResponse {
            short_url: state.config.short_url(&code),
        })),
        Err(e @ AssignError::CodeSpaceExhausted { .. }) => {
            tracing::error!(error = %e, "could not assign short code");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate a unique short code".to_string(),
                }),
            ))
        }
        Err(AssignError::Storage(e)) => {
            tracing::error!(error = %e, "failed to store short code");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            ))
        }
    }
}

pub async fn welcome() -> &'static str {
    "Welcome to the URL Shortener Service"
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.storage.count_mappings().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "OK".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach storage");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "UNAVAILABLE".to_string(),
                }),
            )
        }
    }
}
