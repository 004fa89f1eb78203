use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::shortcode::CodeAssigner;
use crate::storage::Storage;

use super::analytics::get_analytics;
use super::handlers::{health_check, shorten_url, welcome, AppState};

pub fn create_api_router(storage: Arc<dyn Storage>, config: Arc<Config>) -> Router {
    let state = Arc::new(AppState {
        assigner: CodeAssigner::new(Arc::clone(&storage)),
        storage,
        config,
    });

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/shorten", post(shorten_url))
        .route("/analytics/{code}", get(get_analytics))
        .with_state(state)
}
