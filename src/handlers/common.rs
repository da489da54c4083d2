//! Application-level endpoints: welcome, liveness, version, readiness, fallback.

use crate::error::{AppError, ErrorParts, ErrorType};
use crate::response::write_success;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::Response,
};
use serde::Serialize;

#[derive(Serialize)]
struct ProjectInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

const PROJECT: ProjectInfo = ProjectInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    description: env!("CARGO_PKG_DESCRIPTION"),
};

#[derive(Serialize)]
struct Status {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

pub async fn welcome() -> Response {
    write_success(StatusCode::OK, format!("welcome to {}", PROJECT.name), PROJECT, None)
}

pub async fn health() -> Response {
    write_success(
        StatusCode::OK,
        "service is healthy",
        Status {
            status: "ok",
            database: None,
        },
        None,
    )
}

pub async fn version() -> Response {
    write_success(StatusCode::OK, "version retrieved successfully", PROJECT, None)
}

/// 200 when the database answers `SELECT 1`, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> Result<Response, AppError> {
    if let Err(e) = sqlx::query("SELECT 1").fetch_optional(&state.pool).await {
        tracing::warn!(error = %e, "readiness check failed");
        return Err(AppError::service_unavailable(
            ErrorParts::default()
                .message("database is unavailable.")
                .details(serde_json::json!({ "database": "unavailable" })),
        ));
    }
    Ok(write_success(
        StatusCode::OK,
        "service is ready",
        Status {
            status: "ok",
            database: Some("ok"),
        },
        None,
    ))
}

pub async fn page_not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(
        ErrorParts::default()
            .kind(ErrorType::PageNotFound)
            .message(format!("the requested url {} was not found for method {}.", uri, method)),
    )
}
