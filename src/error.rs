//! Typed errors, the error taxonomy, and HTTP mapping.

mod builder;

pub use builder::{Condition, ErrorParts};

use crate::response::{write_error, Envelope};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Machine-readable error type carried in `errors[].type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    // validation
    InvalidData,
    MissingField,
    InvalidDataType,
    ValueTooShort,
    ValueTooLong,
    MinValue,
    MaxValue,
    PatternMismatch,
    EnumMismatch,

    // authentication & authorization
    InvalidCredentials,
    MissingToken,
    ExpiredToken,
    UnauthorizedAccess,
    ForbiddenResource,

    // database & conflict
    UniqueConstraintViolation,
    ForeignKeyViolation,
    RecordNotFound,
    DatabaseConnectionError,

    // routing
    PageNotFound,
    MethodNotAllowed,

    // server
    InternalServerError,
    ServiceUnavailable,
    UnknownError,
}

/// One entry of the envelope's `errors` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorType) -> Self {
        ErrorRecord { kind, details: None }
    }

    pub fn with_details(kind: ErrorType, details: Value) -> Self {
        ErrorRecord {
            kind,
            details: Some(details),
        }
    }
}

/// A normalized failure: the error half of the response envelope.
///
/// Everything the handlers return as `Err` is an `AppError`; unexpected
/// failures are funneled through [`AppError::normalize`] before they get here.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<ErrorRecord>,
    /// Set on everything the builder constructs. A foreign error is rewritten
    /// by `normalize` and answered with 500 by the handler.
    pub locally_made: bool,
}

impl AppError {
    /// Error that did not originate from this system's own logic.
    pub fn foreign(message: impl Into<String>) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            errors: Vec::new(),
            locally_made: false,
        }
    }

    /// Type of the first error record, if any.
    pub fn kind(&self) -> Option<ErrorType> {
        self.errors.first().map(|e| e.kind)
    }

    pub fn into_envelope(self) -> Envelope<Value> {
        Envelope {
            success: false,
            status_code: self.status.as_u16(),
            message: self.message,
            data: None,
            errors: Some(self.errors),
            is_locally_made_error: Some(self.locally_made),
            meta: None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::normalize(e)
    }
}

/// Centralized handler: picks the status and writes the envelope, nothing else.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.locally_made {
            self.status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::warn!(status = %status, message = %self.message, errors = ?self.errors, "request failed");
        } else {
            tracing::debug!(status = %status, kind = ?self.kind(), "request rejected");
        }
        write_error(status, self.message, self.errors, None)
    }
}
