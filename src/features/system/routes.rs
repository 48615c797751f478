use axum::{routing::get, Router};

use crate::features::system::handlers;

/// Create routes for the root and health endpoints
pub fn routes() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
}
