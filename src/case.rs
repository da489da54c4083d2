//! Database (snake_case) column names to API (camelCase) keys.

use serde_json::{Map, Value};

/// "created_at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename the top-level keys of a row to camelCase, keeping column order.
pub fn row_to_camel_case(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_identifiers() {
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("job_title"), "jobTitle");
        assert_eq!(to_camel_case("created_at"), "createdAt");
    }

    #[test]
    fn renames_row_keys_in_order() {
        let row = json!({ "id": 1, "first_name": "Abebe", "created_at": "2024-01-01T00:00:00Z" });
        let out = row_to_camel_case(row.as_object().cloned().unwrap());
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["id", "firstName", "createdAt"]);
    }
}
