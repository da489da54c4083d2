//! Helpers over field maps: emptiness, exclusion, empty-field stripping.

use serde_json::{Map, Value};

/// Missing, null, blank string, empty array or empty object.
/// Numbers and booleans (including `0` and `false`) are never empty.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Number(_)) | Some(Value::Bool(_)) => false,
    }
}

/// Copy of `data` without the keys listed in `exclude`. Order is preserved.
pub fn exclude_fields(data: &Map<String, Value>, exclude: &[&str]) -> Map<String, Value> {
    data.iter()
        .filter(|(k, _)| !exclude.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn remove_empty_fields(data: &Map<String, Value>) -> Map<String, Value> {
    data.iter()
        .filter(|(_, v)| !is_empty(Some(v)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn empty_fields(data: &Map<String, Value>) -> Vec<String> {
    data.iter()
        .filter(|(_, v)| is_empty(Some(v)))
        .map(|(k, _)| k.clone())
        .collect()
}

/// Canonical hyphenated UUID (8-4-4-4-12 hex). Braced, URN and simple forms are rejected.
pub fn is_valid_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness() {
        assert!(is_empty(None));
        assert!(is_empty(Some(&Value::Null)));
        assert!(is_empty(Some(&json!("   "))));
        assert!(is_empty(Some(&json!([]))));
        assert!(is_empty(Some(&json!({}))));
        assert!(!is_empty(Some(&json!(0))));
        assert!(!is_empty(Some(&json!(false))));
        assert!(!is_empty(Some(&json!("x"))));
        assert!(!is_empty(Some(&json!([null]))));
    }

    #[test]
    fn strips_and_excludes_in_order() {
        let data = json!({ "a": 1, "b": "", "c": "x", "d": null })
            .as_object()
            .cloned()
            .unwrap();
        let kept = remove_empty_fields(&data);
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        let excluded = exclude_fields(&data, &["a", "d"]);
        assert_eq!(excluded.keys().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(empty_fields(&data), vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn uuid_format() {
        assert!(is_valid_uuid("af953bc8-0821-4358-a4bc-1b60ec1c119f"));
        assert!(is_valid_uuid("AF953BC8-0821-4358-A4BC-1B60EC1C119F"));
        assert!(!is_valid_uuid("af953bc808214358a4bc1b60ec1c119f"));
        assert!(!is_valid_uuid("{af953bc8-0821-4358-a4bc-1b60ec1c119f}"));
        assert!(!is_valid_uuid("abcdefghij"));
    }
}
