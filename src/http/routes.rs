//! Axum router configuration

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{cache_stats, health_check, list_assets, serve_asset, version_check};
use super::ServeState;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<ServeState>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/assets", get(list_assets))
        .route("/debug/cache", get(cache_stats))
        // GET also answers HEAD; preflight OPTIONS is handled by the CORS layer
        .route("/{*path}", get(serve_asset))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        // Safari wants explicit headers and private network access
        // when players run on a different local origin.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS, Method::HEAD])
            .allow_headers([
                header::ACCEPT,
                header::RANGE,
                header::CONTENT_TYPE,
                header::ORIGIN,
            ])
            .allow_private_network(true)
            .max_age(Duration::from_secs(3600));
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}
