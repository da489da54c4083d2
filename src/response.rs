//! Standard response envelope and its writers.

use crate::error::ErrorRecord;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire shape of every response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<ErrorRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locally_made_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl<T> Envelope<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T, meta: Option<Map<String, Value>>) -> Self {
        Envelope {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            data: Some(data),
            errors: None,
            is_locally_made_error: None,
            meta,
        }
    }

    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Vec<ErrorRecord>,
        meta: Option<Map<String, Value>>,
    ) -> Self {
        Envelope {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            data: None,
            errors: Some(errors),
            is_locally_made_error: None,
            meta,
        }
    }
}

/// `meta` with a single `count` entry, attached to list responses.
pub fn count_meta(count: usize) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("count".to_string(), Value::from(count as u64));
    meta
}

pub fn write_success<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
    meta: Option<Map<String, Value>>,
) -> Response {
    (status, Json(Envelope::success(status, message, data, meta))).into_response()
}

pub fn write_error(
    status: StatusCode,
    message: impl Into<String>,
    errors: Vec<ErrorRecord>,
    meta: Option<Map<String, Value>>,
) -> Response {
    (status, Json(Envelope::<Value>::error(status, message, errors, meta))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let env = Envelope::success(StatusCode::CREATED, "created", json!({ "id": 1 }), None);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(
            v,
            json!({
                "success": true,
                "statusCode": 201,
                "message": "created",
                "data": { "id": 1 },
                "errors": null
            })
        );
    }

    #[test]
    fn error_envelope_shape() {
        let env = Envelope::<Value>::error(
            StatusCode::NOT_FOUND,
            "missing",
            vec![ErrorRecord::new(ErrorType::PageNotFound)],
            Some(count_meta(0)),
        );
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["data"], Value::Null);
        assert_eq!(v["errors"][0]["type"], "pageNotFound");
        assert!(v["errors"][0].get("details").is_none());
        assert_eq!(v["meta"]["count"], 0);
        assert!(v.get("isLocallyMadeError").is_none());
    }

    #[test]
    fn writers_set_status() {
        assert_eq!(write_success(StatusCode::OK, "ok", json!([]), None).status(), StatusCode::OK);
        let errors = vec![ErrorRecord::new(ErrorType::UniqueConstraintViolation)];
        assert_eq!(write_error(StatusCode::CONFLICT, "dup", errors, None).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn error_envelope_always_carries_errors() {
        let v = serde_json::to_value(Envelope::<Value>::error(StatusCode::BAD_REQUEST, "bad", vec![], None)).unwrap();
        assert_eq!(v["data"], Value::Null);
        assert_eq!(v["errors"], json!([]));
    }
}
