//! Reusable custom checks.

use super::rule::CustomFailure;
use crate::error::ErrorType;
use crate::fields::is_valid_uuid;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// E.164: optional `+`, no leading zero, at most 15 digits.
pub const PHONE_NUMBER_PATTERN: &str = r"^\+?[1-9]\d{1,14}$";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_NUMBER_PATTERN).expect("static regex compiles"))
}

pub fn phone_number(value: &Value) -> Option<CustomFailure> {
    match value.as_str() {
        Some(s) if phone_regex().is_match(s) => None,
        _ => Some(CustomFailure {
            kind: ErrorType::PatternMismatch,
            message: "value must be a valid phone number in E.164 format (e.g., +1234567890).".to_string(),
            hint: Some(Value::String(PHONE_NUMBER_PATTERN.to_string())),
        }),
    }
}

pub fn uuid(value: &Value) -> Option<CustomFailure> {
    match value.as_str() {
        Some(s) if is_valid_uuid(s) => None,
        _ => Some(CustomFailure {
            kind: ErrorType::InvalidDataType,
            message: "value must be a valid uuid".to_string(),
            hint: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phone_numbers() {
        assert!(phone_number(&json!("+254712345678")).is_none());
        assert!(phone_number(&json!("254712345678")).is_none());
        assert!(phone_number(&json!("+0123")).is_some());
        assert!(phone_number(&json!("12-34")).is_some());
        assert!(phone_number(&json!(254712345678u64)).is_some());
    }

    #[test]
    fn uuids() {
        assert!(uuid(&json!("af953bc8-0821-4358-a4bc-1b60ec1c119f")).is_none());
        assert_eq!(uuid(&json!("nope")).map(|f| f.kind), Some(ErrorType::InvalidDataType));
    }
}
