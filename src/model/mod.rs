//! Generic model: the capability trait every resource implements, plus the
//! audit block shared by all of them.

mod employee;

pub use employee::{Employee, JobTitle};

use crate::fields::{exclude_fields, is_empty, remove_empty_fields};
use crate::validation::{validate, FieldType, Rule, Rules, ValidationError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One allowed column: API field name, database column name, PostgreSQL type
/// used to cast bound parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub name: &'static str,
    pub pg_type: &'static str,
}

impl Column {
    pub const fn new(field: &'static str, name: &'static str, pg_type: &'static str) -> Self {
        Column { field, name, pg_type }
    }
}

/// Audit columns present on every resource table.
pub const AUDIT_COLUMNS: [Column; 6] = [
    Column::new("createdAt", "created_at", "timestamptz"),
    Column::new("updatedAt", "updated_at", "timestamptz"),
    Column::new("deletedAt", "deleted_at", "timestamptz"),
    Column::new("createdBy", "created_by", "uuid"),
    Column::new("updatedBy", "updated_by", "uuid"),
    Column::new("deletedBy", "deleted_by", "uuid"),
];

/// Who touched a record and when. `*_by` are employee ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Audit {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
}

impl Audit {
    /// Append the set audit fields to `out` under their API names.
    pub fn write_fields(&self, out: &mut Map<String, Value>) {
        let stamps = [
            ("createdAt", self.created_at),
            ("updatedAt", self.updated_at),
            ("deletedAt", self.deleted_at),
        ];
        for (field, at) in stamps {
            if let Some(at) = at {
                out.insert(field.to_string(), Value::String(timestamp(at)));
            }
        }
        let actors = [
            ("createdBy", self.created_by),
            ("updatedBy", self.updated_by),
            ("deletedBy", self.deleted_by),
        ];
        for (field, by) in actors {
            if let Some(by) = by {
                out.insert(field.to_string(), Value::String(by.to_string()));
            }
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A resource the generic service, controller and routes can work with.
pub trait Model: Send + Sync + Sized + 'static {
    /// Table name. Never derived from a request.
    const TABLE: &'static str;
    /// Name used in response messages, e.g. "employees".
    const NAME: &'static str;

    /// Column allow-list in field order. Only these are ever written or selected.
    fn columns() -> &'static [Column];

    fn from_request(body: &Map<String, Value>) -> Self;

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;

    fn rules(&self) -> Rules;

    /// Present fields keyed by API name, in column order. Absent fields have no key.
    fn all_fields(&self) -> Map<String, Value>;

    fn insert_exclude_fields(&self) -> &'static [&'static str];

    fn update_exclude_fields(&self) -> &'static [&'static str];

    fn default_rules() -> Rules {
        Rules::new()
            .field("id", Rule::new().optional())
            .field("createdAt", Rule::new().of_type(FieldType::Date))
            .field("updatedAt", Rule::new().of_type(FieldType::Date))
            .field("deletedAt", Rule::new().of_type(FieldType::Date))
            .field("createdBy", Rule::new())
            .field("updatedBy", Rule::new())
            .field("deletedBy", Rule::new())
    }

    fn insert_view(&self) -> Map<String, Value> {
        exclude_fields(&remove_empty_fields(&self.all_fields()), self.insert_exclude_fields())
    }

    fn update_view(&self) -> Map<String, Value> {
        exclude_fields(&remove_empty_fields(&self.all_fields()), self.update_exclude_fields())
    }

    fn validate_for_insertion(&self) -> Vec<ValidationError> {
        let fields = self.all_fields();
        validate_fields(self, &fields, |name| self.insert_exclude_fields().contains(&name))
    }

    /// Partial validation: fields the caller left empty are not checked.
    fn validate_for_update(&self) -> Vec<ValidationError> {
        let fields = self.all_fields();
        validate_fields(self, &fields, |name| {
            self.update_exclude_fields().contains(&name) || is_empty(fields.get(name))
        })
    }
}

/// Validate every model field not rejected by `skip`, in column order, with
/// the model's rule for that field.
fn validate_fields<M: Model>(
    model: &M,
    fields: &Map<String, Value>,
    skip: impl Fn(&str) -> bool,
) -> Vec<ValidationError> {
    let rules = model.rules();
    let selected: Rules = M::columns()
        .iter()
        .filter(|c| !skip(c.field))
        .filter_map(|c| rules.get(c.field).map(|r| (c.field.to_string(), r.clone())))
        .collect();
    validate(fields, &selected)
}
