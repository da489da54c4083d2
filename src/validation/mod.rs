//! Declarative field validation: ordered per-field rules evaluated against a
//! JSON record, producing at most one typed error per field.

mod checks;
mod rule;
mod validator;

pub use checks::{phone_number, uuid, PHONE_NUMBER_PATTERN};
pub use rule::{CustomCheck, CustomFailure, FieldType, Rule, Rules, Transform};
pub use validator::validate;

use crate::error::{ErrorRecord, ErrorType};
use serde_json::{Map, Value};

/// One failed field check.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorType,
    pub details: ValidationDetails,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationDetails {
    /// `{field: raw value}` exactly as the caller sent it. The key is absent
    /// when the caller sent nothing.
    pub key_value: Map<String, Value>,
    pub message: String,
    pub hint: Option<Value>,
}

impl ValidationError {
    pub fn new(kind: ErrorType, field: &str, raw: Option<&Value>, message: impl Into<String>) -> Self {
        let mut key_value = Map::new();
        if let Some(v) = raw {
            key_value.insert(field.to_string(), v.clone());
        }
        ValidationError {
            kind,
            details: ValidationDetails {
                key_value,
                message: message.into(),
                hint: None,
            },
        }
    }

    pub fn with_hint(mut self, hint: impl Into<Value>) -> Self {
        self.details.hint = Some(hint.into());
        self
    }
}

impl ValidationDetails {
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("keyValue".to_string(), Value::Object(self.key_value.clone()));
        out.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(hint) = &self.hint {
            out.insert("hint".to_string(), hint.clone());
        }
        Value::Object(out)
    }
}

impl From<ValidationError> for ErrorRecord {
    fn from(e: ValidationError) -> Self {
        ErrorRecord::with_details(e.kind, e.details.to_value())
    }
}
