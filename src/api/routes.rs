//! API Routes
//!
//! Configures the Axum router with all cache node endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{get_handler, health_handler, set_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", post(set_handler))
        .route("/get", get(get_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
