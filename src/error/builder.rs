//! Builds normalized errors: one constructor per status family plus the
//! dispatch that turns arbitrary failures into an `AppError`.

use super::{AppError, ErrorRecord, ErrorType};
use crate::validation::ValidationError;
use axum::http::StatusCode;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

/// SQLSTATE codes the dispatcher understands.
pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Optional overrides for a family constructor. Unset parts fall back to the
/// family's default type and message.
#[derive(Clone, Debug, Default)]
pub struct ErrorParts {
    pub kind: Option<ErrorType>,
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl ErrorParts {
    pub fn kind(mut self, kind: ErrorType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Anything that can fail inside a request.
#[derive(Debug)]
pub enum Condition {
    /// Already an `AppError`; passed through when locally made.
    Error(AppError),
    /// Database driver failure with its SQLSTATE code, when it has one.
    Database { code: Option<String>, message: String },
    /// Anything else, described by its message.
    Other(String),
}

impl From<AppError> for Condition {
    fn from(e: AppError) -> Self {
        Condition::Error(e)
    }
}

impl From<sqlx::Error> for Condition {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => Condition::Database {
                code: db.code().map(|c| c.into_owned()),
                message: db.message().to_string(),
            },
            _ => Condition::Other(e.to_string()),
        }
    }
}

impl From<String> for Condition {
    fn from(message: String) -> Self {
        Condition::Other(message)
    }
}

impl From<&str> for Condition {
    fn from(message: &str) -> Self {
        Condition::Other(message.to_string())
    }
}

fn invalid_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"invalid input syntax for type \w+: "([^"]+)""#).expect("static regex compiles")
    })
}

impl AppError {
    fn family(status: StatusCode, default_kind: ErrorType, default_message: &str, parts: ErrorParts) -> Self {
        AppError {
            status,
            message: parts.message.unwrap_or_else(|| default_message.to_string()),
            errors: vec![ErrorRecord {
                kind: parts.kind.unwrap_or(default_kind),
                details: parts.details,
            }],
            locally_made: true,
        }
    }

    pub fn authentication(parts: ErrorParts) -> Self {
        Self::family(StatusCode::UNAUTHORIZED, ErrorType::MissingToken, "unauthenticated user.", parts)
    }

    pub fn authorization(parts: ErrorParts) -> Self {
        Self::family(StatusCode::FORBIDDEN, ErrorType::UnauthorizedAccess, "unauthorized user.", parts)
    }

    pub fn validation(errors: Vec<ValidationError>) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            message: "validation failed.".to_string(),
            errors: errors.into_iter().map(ErrorRecord::from).collect(),
            locally_made: true,
        }
    }

    pub fn not_found(parts: ErrorParts) -> Self {
        Self::family(StatusCode::NOT_FOUND, ErrorType::RecordNotFound, "resource not found.", parts)
    }

    pub fn conflict(parts: ErrorParts) -> Self {
        Self::family(StatusCode::CONFLICT, ErrorType::UniqueConstraintViolation, "conflict occurred.", parts)
    }

    pub fn internal(parts: ErrorParts) -> Self {
        Self::family(StatusCode::INTERNAL_SERVER_ERROR, ErrorType::InternalServerError, "internal server error.", parts)
    }

    pub fn not_implemented(parts: ErrorParts) -> Self {
        Self::family(StatusCode::NOT_IMPLEMENTED, ErrorType::ServiceUnavailable, "not implemented yet.", parts)
    }

    pub fn service_unavailable(parts: ErrorParts) -> Self {
        Self::family(StatusCode::SERVICE_UNAVAILABLE, ErrorType::ServiceUnavailable, "service unavailable.", parts)
    }

    pub fn unknown(parts: ErrorParts) -> Self {
        Self::family(StatusCode::INTERNAL_SERVER_ERROR, ErrorType::UnknownError, "unknown error occurred.", parts)
    }

    /// Turn any failure into a normalized error. Never fails; idempotent on
    /// locally made errors.
    pub fn normalize(condition: impl Into<Condition>) -> Self {
        match condition.into() {
            Condition::Error(e) if e.locally_made => e,
            Condition::Error(e) => Self::unknown(ErrorParts::default().details(Value::String(e.message))),
            Condition::Database { code: Some(code), message } => Self::from_database_code(&code, message),
            Condition::Database { code: None, message } | Condition::Other(message) => {
                Self::unknown(ErrorParts::default().details(Value::String(message)))
            }
        }
    }

    fn from_database_code(code: &str, message: String) -> Self {
        match code {
            UNIQUE_VIOLATION => Self::conflict(ErrorParts::default().details(Value::String(message))),
            FOREIGN_KEY_VIOLATION => Self::not_found(ErrorParts::default().details(Value::String(message))),
            INVALID_TEXT_REPRESENTATION => {
                let invalid_value = invalid_input_regex()
                    .captures(&message)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let record = ErrorRecord::with_details(
                    ErrorType::InvalidDataType,
                    json!({
                        "keyValue": { "id": invalid_value },
                        "message": message,
                    }),
                );
                AppError {
                    status: StatusCode::BAD_REQUEST,
                    message: "validation failed.".to_string(),
                    errors: vec![record],
                    locally_made: true,
                }
            }
            other => {
                tracing::debug!(code = %other, "unmapped database error code");
                Self::unknown(ErrorParts::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(code: &str, message: &str) -> Condition {
        Condition::Database {
            code: Some(code.to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let e = AppError::normalize(db("23505", "duplicate key value violates unique constraint \"employees_phone_key\""));
        assert_eq!(e.status, StatusCode::CONFLICT);
        assert_eq!(e.kind(), Some(ErrorType::UniqueConstraintViolation));
        assert!(e.locally_made);
        assert_eq!(
            e.errors[0].details,
            Some(Value::String("duplicate key value violates unique constraint \"employees_phone_key\"".into()))
        );
    }

    #[test]
    fn foreign_key_violation_becomes_not_found() {
        let e = AppError::normalize(db("23503", "insert or update violates foreign key constraint"));
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.kind(), Some(ErrorType::RecordNotFound));
    }

    #[test]
    fn invalid_text_representation_extracts_value() {
        let e = AppError::normalize(db("22P02", "invalid input syntax for type uuid: \"abc\""));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.message, "validation failed.");
        assert_eq!(e.kind(), Some(ErrorType::InvalidDataType));
        let details = e.errors[0].details.as_ref().unwrap();
        assert_eq!(details["keyValue"]["id"], "abc");
        assert_eq!(details["message"], "invalid input syntax for type uuid: \"abc\"");
    }

    #[test]
    fn invalid_text_representation_without_match_uses_unknown() {
        let e = AppError::normalize(db("22P02", "something else entirely"));
        assert_eq!(e.errors[0].details.as_ref().unwrap()["keyValue"]["id"], "Unknown");
    }

    #[test]
    fn unrecognized_code_is_unknown() {
        let e = AppError::normalize(db("🤷", "whatever"));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.kind(), Some(ErrorType::UnknownError));
        assert_eq!(e.message, "unknown error occurred.");
        assert_eq!(e.errors[0].details, None);
    }

    #[test]
    fn plain_failure_keeps_message_as_details() {
        let e = AppError::normalize("connection reset by peer");
        assert_eq!(e.kind(), Some(ErrorType::UnknownError));
        assert_eq!(e.errors[0].details, Some(Value::String("connection reset by peer".into())));

        let e = AppError::normalize(Condition::Database {
            code: None,
            message: "no code here".into(),
        });
        assert_eq!(e.errors[0].details, Some(Value::String("no code here".into())));
    }

    #[test]
    fn normalize_is_idempotent_on_local_errors() {
        let once = AppError::normalize(db("23505", "dup"));
        let twice = AppError::normalize(once.clone());
        assert_eq!(once, twice);

        let auth = AppError::authentication(ErrorParts::default());
        assert_eq!(AppError::normalize(auth.clone()), auth);
    }

    #[test]
    fn foreign_errors_are_rewritten() {
        let e = AppError::normalize(AppError::foreign("boom"));
        assert!(e.locally_made);
        assert_eq!(e.kind(), Some(ErrorType::UnknownError));
        assert_eq!(e.errors[0].details, Some(Value::String("boom".into())));
    }

    #[test]
    fn family_defaults() {
        let cases = [
            (AppError::authentication(ErrorParts::default()), 401, ErrorType::MissingToken, "unauthenticated user."),
            (AppError::authorization(ErrorParts::default()), 403, ErrorType::UnauthorizedAccess, "unauthorized user."),
            (AppError::not_found(ErrorParts::default()), 404, ErrorType::RecordNotFound, "resource not found."),
            (AppError::conflict(ErrorParts::default()), 409, ErrorType::UniqueConstraintViolation, "conflict occurred."),
            (AppError::internal(ErrorParts::default()), 500, ErrorType::InternalServerError, "internal server error."),
            (AppError::not_implemented(ErrorParts::default()), 501, ErrorType::ServiceUnavailable, "not implemented yet."),
            (AppError::service_unavailable(ErrorParts::default()), 503, ErrorType::ServiceUnavailable, "service unavailable."),
            (AppError::unknown(ErrorParts::default()), 500, ErrorType::UnknownError, "unknown error occurred."),
        ];
        for (e, status, kind, message) in cases {
            assert_eq!(e.status.as_u16(), status);
            assert_eq!(e.kind(), Some(kind));
            assert_eq!(e.message, message);
            assert!(e.locally_made);
        }
    }

    #[test]
    fn family_overrides() {
        let e = AppError::authentication(
            ErrorParts::default()
                .kind(ErrorType::ExpiredToken)
                .message("token expired")
                .details(json!({ "expiredAt": "yesterday" })),
        );
        assert_eq!(e.kind(), Some(ErrorType::ExpiredToken));
        assert_eq!(e.message, "token expired");
        assert_eq!(e.errors[0].details.as_ref().unwrap()["expiredAt"], "yesterday");
    }
}
