//! Analytics API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::handlers::{AppState, ErrorResponse};
use crate::analytics::visit_log;

/// Visits for a short code as `[timestamp, ipAddress]` pairs, oldest first
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> impl IntoResponse {
    match visit_log(state.storage.as_ref(), &short_code).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            tracing::error!("Failed to get analytics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve analytics".to_string(),
                }),
            )
                .into_response()
        }
    }
}
