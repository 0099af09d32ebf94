// --- File: crates/calrelay_common/src/routes.rs ---

use axum::{routing::get, Router};

use crate::handlers::health_handler;

/// Creates a router containing the routes shared by every calrelay service.
pub fn routes() -> Router {
    Router::new().route("/health", get(health_handler))
}
