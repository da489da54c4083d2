use super::rule::{Rule, Rules};
use super::ValidationError;
use crate::error::ErrorType;
use crate::fields::is_empty;
use serde_json::{Map, Value};

/// Validate `record` against `rules`, one field at a time in rule order.
///
/// Checks for a field stop at the first failure, so a field yields at most
/// one error. Errors report the raw value the caller sent, not the
/// transformed one.
pub fn validate(record: &Map<String, Value>, rules: &Rules) -> Vec<ValidationError> {
    rules
        .iter()
        .filter_map(|(field, rule)| check_field(field, record.get(field), rule))
        .collect()
}

fn check_field(field: &str, raw: Option<&Value>, rule: &Rule) -> Option<ValidationError> {
    let transformed = rule.transform.as_ref().map(|t| t(raw));
    let value = match &transformed {
        Some(t) => t.as_ref(),
        None => raw,
    };
    let fail = |kind: ErrorType, message: String| Some(ValidationError::new(kind, field, raw, message));

    if !rule.optional && is_empty(value) {
        return fail(ErrorType::MissingField, format!("{} is required and was not provided", field));
    }
    // Optional fields still run every later check; an absent one is checked as null.
    let value = value.unwrap_or(&Value::Null);

    if let Some(field_type) = rule.field_type {
        if !is_empty(Some(value)) && !field_type.accepts(value) {
            return fail(
                ErrorType::InvalidDataType,
                format!("{} must be a data type of {}", field, field_type),
            );
        }
    }

    if let Some(s) = value.as_str() {
        let len = s.chars().count();
        if let Some(min) = rule.min_len {
            if len < min {
                return fail(
                    ErrorType::ValueTooShort,
                    format!("{} must be at least {} characters long", field, min),
                );
            }
        }
        if let Some(max) = rule.max_len {
            if len > max {
                return fail(
                    ErrorType::ValueTooLong,
                    format!("{} must be at most {} characters long", field, max),
                );
            }
        }
        if let Some(re) = &rule.pattern {
            if !re.is_match(s) {
                return fail(
                    ErrorType::PatternMismatch,
                    format!("{} must match the pattern /{}/", field, re.as_str()),
                );
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = rule.min {
            if n < min {
                return fail(ErrorType::MinValue, format!("{} must be at least {}", field, fmt_number(min)));
            }
        }
        if let Some(max) = rule.max {
            if n > max {
                return fail(ErrorType::MaxValue, format!("{} must be at most {}", field, fmt_number(max)));
            }
        }
    }

    if let Some(allowed) = &rule.one_of {
        if !allowed.iter().any(|a| value_eq(value, a)) {
            let listed = allowed.iter().map(display_value).collect::<Vec<_>>().join(", ");
            return fail(ErrorType::EnumMismatch, format!("{} must be one of {}", field, listed));
        }
    }

    let custom = rule.custom.as_ref()?;
    let failure = custom(value)?;
    let mut err = ValidationError::new(failure.kind, field, raw, failure.message);
    err.details.hint = failure.hint;
    Some(err)
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
