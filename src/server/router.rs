use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{health, query};
use crate::state::AppState;

/// Creates the application router.
///
/// Routes: the embedded chat page, a health probe, and the query endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(query::index))
        .route("/health", get(health::health))
        .route("/query", post(query::process_query))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
