use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, ingest};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog queries
        .route("/catalog/channels", get(catalog::list_channels))
        .route("/catalog/themes", get(catalog::list_themes))
        .route("/catalog/titles", get(catalog::list_titles))
        .route("/catalog/entry", get(catalog::get_entry))
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/recent", get(catalog::recent))
        .route("/catalog/stats", get(catalog::get_stats))
        // Ingestion control
        .route("/catalog/refresh", post(ingest::refresh))
        .route("/catalog/update", post(ingest::update))
        .route("/catalog/cancel", post(ingest::cancel))
        .route("/catalog/ingest", get(ingest::status))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(crate::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
}
