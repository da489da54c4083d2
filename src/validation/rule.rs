//! Rule types. A `Rules` table is declared once per entity type.

use crate::error::ErrorType;
use chrono::DateTime;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Rewrites the raw value before any check runs. Receives `None` when the
/// field is absent.
pub type Transform = Arc<dyn Fn(Option<&Value>) -> Option<Value> + Send + Sync>;

/// Last check for a field. Returning `Some` reports a failure.
pub type CustomCheck = Arc<dyn Fn(&Value) -> Option<CustomFailure> + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub struct CustomFailure {
    pub kind: ErrorType,
    pub message: String,
    pub hint: Option<Value>,
}

/// Runtime category a field may be constrained to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// RFC 3339 timestamp string.
    Date,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Date => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative checks for one field. Built with the chained setters:
///
/// ```
/// use hotel_api::validation::{FieldType, Rule};
///
/// let rule = Rule::new().of_type(FieldType::String).min_len(2).max_len(255);
/// assert!(!rule.optional);
/// ```
#[derive(Clone, Default)]
pub struct Rule {
    pub field_type: Option<FieldType>,
    pub optional: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub one_of: Option<Vec<Value>>,
    pub pattern: Option<Regex>,
    pub transform: Option<Transform>,
    pub custom: Option<CustomCheck>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Option<Value> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<CustomFailure> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("field_type", &self.field_type)
            .field("optional", &self.optional)
            .field("min_len", &self.min_len)
            .field("max_len", &self.max_len)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("one_of", &self.one_of)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("transform", &self.transform.is_some())
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Rules keyed by field name, evaluated in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Rules(Vec<(String, Rule)>);

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing an existing rule for the same field in place.
    pub fn field(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.insert(name.into(), rule);
        self
    }

    pub fn insert(&mut self, name: String, rule: Rule) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rule,
            None => self.0.push((name, rule)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.0.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<(String, Rule)> for Rules {
    fn extend<T: IntoIterator<Item = (String, Rule)>>(&mut self, iter: T) {
        for (name, rule) in iter {
            self.insert(name, rule);
        }
    }
}

impl FromIterator<(String, Rule)> for Rules {
    fn from_iter<T: IntoIterator<Item = (String, Rule)>>(iter: T) -> Self {
        let mut rules = Rules::new();
        rules.extend(iter);
        rules
    }
}

impl IntoIterator for Rules {
    type Item = (String, Rule);
    type IntoIter = std::vec::IntoIter<(String, Rule)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
