//! Router assembly.

mod common;
mod resource;

pub use common::{common_routes, ready_routes};
pub use resource::resource_routes;

use crate::config::Settings;
use crate::handlers::common::page_not_found;
use crate::handlers::Controller;
use crate::model::Employee;
use axum::Router;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

pub const API_PREFIX: &str = "/api/v1";

/// Every resource router plus the common routes, with the not-found fallback.
pub fn app(employees: Arc<Controller<Employee>>) -> Router {
    Router::new()
        .merge(common_routes())
        .nest(&format!("{}/employees", API_PREFIX), resource_routes(employees))
        .fallback(page_not_found)
}

/// Wrap a router in the HTTP middleware stack.
pub fn layered(router: Router, settings: &Settings) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}
