use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::config::Config;
use crate::redirect::create_redirect_router;
use crate::storage::Storage;

/// Full HTTP surface: API routes plus the `/{code}` redirect route.
///
/// Serve with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// redirect handler reads the peer address from `ConnectInfo`.
pub fn create_app(storage: Arc<dyn Storage>, config: Arc<Config>) -> Router {
    let redirect_router = create_redirect_router(Arc::clone(&storage), config.analytics.clone());
    let api_router = create_api_router(storage, config);

    api_router
        .merge(redirect_router)
        .layer(TraceLayer::new_for_http())
}
