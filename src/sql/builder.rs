//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for one resource table.
//! Identifiers come only from the model's column allow-list and table constant.

use super::params::PgBindValue;
use crate::model::Column;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Quote identifier for PostgreSQL (safe: only from the allow-list).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// `$n::type` placeholder for a freshly bound value.
    fn push_cast(&mut self, v: PgBindValue, pg_type: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type)
    }
}

/// Rows an UPDATE or soft DELETE applies to.
#[derive(Clone, Debug)]
pub enum Target {
    One(Uuid),
    Many(Vec<Uuid>),
}

impl Target {
    fn condition(&self, q: &mut QueryBuf, id_column: &str) -> String {
        match self {
            Target::One(id) => format!("{} = ${}", quoted(id_column), q.push_param(PgBindValue::Uuid(*id))),
            Target::Many(ids) => format!(
                "{} = ANY(${})",
                quoted(id_column),
                q.push_param(PgBindValue::UuidArray(ids.clone()))
            ),
        }
    }
}

/// Resource table plus its allowed columns.
#[derive(Clone, Copy, Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    fn qualified(&self) -> String {
        quoted(self.name)
    }

    fn column(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }

    fn id_column(&self) -> &str {
        self.column("id").map(|c| c.name).unwrap_or("id")
    }

    fn deleted_at_column(&self) -> &str {
        self.column("deletedAt").map(|c| c.name).unwrap_or("deleted_at")
    }

    fn deleted_by_column(&self) -> &str {
        self.column("deletedBy").map(|c| c.name).unwrap_or("deleted_by")
    }

    fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quoted(c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn not_deleted(&self) -> String {
        format!("{} IS NULL", quoted(self.deleted_at_column()))
    }

    /// `(column, placeholder)` for each allowed field in `values`; unknown fields are dropped.
    fn assignments(&self, q: &mut QueryBuf, values: &Map<String, Value>) -> Vec<(String, String)> {
        values
            .iter()
            .filter_map(|(field, v)| {
                let c = self.column(field)?;
                let ph = q.push_cast(PgBindValue::from_json(v), c.pg_type);
                Some((quoted(c.name), ph))
            })
            .collect()
    }
}

/// INSERT of the given API-keyed values. RETURNING the full column list.
pub fn insert(table: &Table, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pairs = table.assignments(&mut q, values);
    let returning = table.select_list();
    q.sql = if pairs.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table.qualified(), returning)
    } else {
        let (cols, placeholders): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table.qualified(),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// SELECT one live (not soft-deleted) row by id.
pub fn select_by_id(table: &Table, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cond = Target::One(id).condition(&mut q, table.id_column());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} AND {}",
        table.select_list(),
        table.qualified(),
        cond,
        table.not_deleted()
    );
    q
}

/// SELECT live rows whose id is in `ids`.
pub fn select_by_ids(table: &Table, ids: &[Uuid]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cond = Target::Many(ids.to_vec()).condition(&mut q, table.id_column());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} AND {}",
        table.select_list(),
        table.qualified(),
        cond,
        table.not_deleted()
    );
    q
}

/// UPDATE live rows matching `target`, SET only allowed fields present in `values`.
/// Returns `None` when nothing would be set.
pub fn update(table: &Table, target: &Target, values: &Map<String, Value>, returning: bool) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let sets = table
        .assignments(&mut q, values)
        .into_iter()
        .map(|(col, ph)| format!("{} = {}", col, ph))
        .collect::<Vec<_>>();
    if sets.is_empty() {
        return None;
    }
    let cond = target.condition(&mut q, table.id_column());
    let returning_clause = if returning {
        format!(" RETURNING {}", table.select_list())
    } else {
        String::new()
    };
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} AND {}{}",
        table.qualified(),
        sets.join(", "),
        cond,
        table.not_deleted(),
        returning_clause
    );
    Some(q)
}

/// Soft delete: stamp deleted_at / deleted_by on live rows matching `target`.
pub fn soft_delete(table: &Table, target: &Target, at: DateTime<Utc>, by: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let at_ph = q.push_param(PgBindValue::Timestamp(at));
    let by_ph = q.push_param(PgBindValue::Uuid(by));
    let cond = target.condition(&mut q, table.id_column());
    q.sql = format!(
        "UPDATE {} SET {} = ${}, {} = ${} WHERE {} AND {}",
        table.qualified(),
        quoted(table.deleted_at_column()),
        at_ph,
        quoted(table.deleted_by_column()),
        by_ph,
        cond,
        table.not_deleted()
    );
    q
}

/// DELETE by id, regardless of soft-delete state.
pub fn delete_permanently(table: &Table, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cond = Target::One(id).condition(&mut q, table.id_column());
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        table.qualified(),
        cond,
        table.select_list()
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: [Column; 5] = [
        Column::new("id", "id", "uuid"),
        Column::new("firstName", "first_name", "text"),
        Column::new("createdAt", "created_at", "timestamptz"),
        Column::new("deletedAt", "deleted_at", "timestamptz"),
        Column::new("deletedBy", "deleted_by", "uuid"),
    ];

    const TABLE: Table = Table {
        name: "employees",
        columns: &COLUMNS,
    };

    const SELECT: &str = "\"id\", \"first_name\", \"created_at\", \"deleted_at\", \"deleted_by\"";

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_uses_allow_list_and_casts() {
        let q = insert(
            &TABLE,
            &values(json!({ "firstName": "Abebe", "createdAt": "2024-01-01T00:00:00.000Z", "hacker\"; DROP": 1 })),
        );
        assert_eq!(
            q.sql,
            format!(
                "INSERT INTO \"employees\" (\"first_name\", \"created_at\") VALUES ($1::text, $2::timestamptz) RETURNING {}",
                SELECT
            )
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let q = insert(&TABLE, &Map::new());
        assert!(q.sql.starts_with("INSERT INTO \"employees\" DEFAULT VALUES"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_skips_soft_deleted_rows() {
        let id = Uuid::new_v4();
        let q = select_by_id(&TABLE, id);
        assert_eq!(
            q.sql,
            format!("SELECT {} FROM \"employees\" WHERE \"id\" = $1 AND \"deleted_at\" IS NULL", SELECT)
        );
        assert_eq!(q.params, vec![PgBindValue::Uuid(id)]);

        let q = select_by_ids(&TABLE, &[id]);
        assert!(q.sql.contains("WHERE \"id\" = ANY($1) AND \"deleted_at\" IS NULL"));
        assert_eq!(q.params, vec![PgBindValue::UuidArray(vec![id])]);
    }

    #[test]
    fn update_binds_target_after_values() {
        let id = Uuid::new_v4();
        let q = update(&TABLE, &Target::One(id), &values(json!({ "firstName": "Almaz" })), false).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"employees\" SET \"first_name\" = $1::text WHERE \"id\" = $2 AND \"deleted_at\" IS NULL"
        );
        assert_eq!(q.params[1], PgBindValue::Uuid(id));

        let q = update(&TABLE, &Target::Many(vec![id]), &values(json!({ "firstName": "Almaz" })), true).unwrap();
        assert!(q.sql.contains("\"id\" = ANY($2)"));
        assert!(q.sql.ends_with(&format!("RETURNING {}", SELECT)));
    }

    #[test]
    fn update_with_nothing_to_set() {
        assert!(update(&TABLE, &Target::One(Uuid::new_v4()), &values(json!({ "unknown": 1 })), false).is_none());
    }

    #[test]
    fn soft_delete_stamps_deleted_by() {
        let q = soft_delete(&TABLE, &Target::Many(vec![Uuid::new_v4()]), Utc::now(), Uuid::new_v4());
        assert_eq!(
            q.sql,
            "UPDATE \"employees\" SET \"deleted_at\" = $1, \"deleted_by\" = $2 WHERE \"id\" = ANY($3) AND \"deleted_at\" IS NULL"
        );
    }

    #[test]
    fn permanent_delete_ignores_soft_delete_state() {
        let q = delete_permanently(&TABLE, Uuid::new_v4());
        assert_eq!(q.sql, format!("DELETE FROM \"employees\" WHERE \"id\" = $1 RETURNING {}", SELECT));
    }
}
