use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::storage::Storage;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(storage: Arc<dyn Storage>, analytics: AnalyticsConfig) -> Router {
    let state = Arc::new(RedirectState { storage, analytics });

    Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
