//! Common routes: welcome, health, version, readiness.

use crate::handlers::common::{health, ready, version, welcome};
use crate::state::AppState;
use axum::{
    routing::{any, get},
    Router,
};

/// Routes that need no state: `/` (any method), GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/", any(welcome))
        .route("/health", get(health))
        .route("/version", get(version))
}

/// GET /ready, pinging the database.
pub fn ready_routes(state: AppState) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
