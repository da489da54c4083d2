//! Generic CRUD execution against PostgreSQL.

use super::{Repository, UpdateResult};
use crate::case::row_to_camel_case;
use crate::error::{AppError, ErrorType};
use crate::model::{timestamp, Model};
use crate::sql::{self, PgBindValue, QueryBuf, Table, Target};
use crate::validation::ValidationError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use std::marker::PhantomData;
use uuid::Uuid;

/// `Repository` over the model's table. Owns a handle to the pool it was given.
pub struct CrudService<M> {
    pool: PgPool,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> CrudService<M> {
    pub fn new(pool: PgPool) -> Self {
        CrudService {
            pool,
            _model: PhantomData,
        }
    }

    fn table() -> Table {
        Table {
            name: M::TABLE,
            columns: M::columns(),
        }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let done = bind_all(sqlx::query(&q.sql), &q.params)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    fn update_query(target: &Target, values: &Map<String, Value>, returning: bool) -> Result<QueryBuf, AppError> {
        sql::update(&Self::table(), target, values, returning).ok_or_else(|| {
            AppError::validation(vec![ValidationError::new(
                ErrorType::MissingField,
                "body",
                Some(&json!({})),
                "no updatable fields were provided",
            )
            .with_hint("provide at least one writable field in request.body")])
        })
    }

    async fn update_target(&self, target: Target, record: &M) -> Result<UpdateResult, AppError> {
        let update_data = record.update_view();
        let q = Self::update_query(&target, &update_data, false)?;
        let count = self.execute(&q).await?;
        Ok(UpdateResult {
            update_data,
            count,
            returning: None,
        })
    }

    async fn soft_delete(&self, target: Target, deleted_by: Uuid) -> Result<UpdateResult, AppError> {
        let now = Utc::now();
        let q = sql::soft_delete(&Self::table(), &target, now, deleted_by);
        let count = self.execute(&q).await?;
        let mut update_data = Map::new();
        update_data.insert("deletedAt".into(), Value::String(timestamp(now)));
        update_data.insert("deletedBy".into(), Value::String(deleted_by.to_string()));
        Ok(UpdateResult {
            update_data,
            count,
            returning: None,
        })
    }
}

#[async_trait]
impl<M: Model> Repository<M> for CrudService<M> {
    async fn insert(&self, record: &M) -> Result<Value, AppError> {
        let q = sql::insert(&Self::table(), &record.insert_view());
        self.fetch_optional(&q)
            .await?
            .ok_or_else(|| AppError::internal(Default::default()))
    }

    async fn read(&self, id: Uuid) -> Result<Option<Value>, AppError> {
        self.fetch_optional(&sql::select_by_id(&Self::table(), id)).await
    }

    async fn read_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Value>, AppError> {
        self.fetch_all(&sql::select_by_ids(&Self::table(), ids)).await
    }

    async fn update(&self, id: Uuid, record: &M) -> Result<UpdateResult, AppError> {
        self.update_target(Target::One(id), record).await
    }

    async fn update_and_return(&self, id: Uuid, record: &M) -> Result<UpdateResult, AppError> {
        let update_data = record.update_view();
        let q = Self::update_query(&Target::One(id), &update_data, true)?;
        let rows = self.fetch_all(&q).await?;
        Ok(UpdateResult {
            update_data,
            count: rows.len() as u64,
            returning: rows.into_iter().next(),
        })
    }

    async fn update_by_ids(&self, ids: &[Uuid], record: &M) -> Result<UpdateResult, AppError> {
        self.update_target(Target::Many(ids.to_vec()), record).await
    }

    async fn delete(&self, id: Uuid, deleted_by: Uuid) -> Result<UpdateResult, AppError> {
        self.soft_delete(Target::One(id), deleted_by).await
    }

    async fn delete_by_ids(&self, ids: &[Uuid], deleted_by: Uuid) -> Result<UpdateResult, AppError> {
        self.soft_delete(Target::Many(ids.to_vec()), deleted_by).await
    }

    async fn delete_permanently(&self, id: Uuid) -> Result<UpdateResult, AppError> {
        let rows = self.fetch_all(&sql::delete_permanently(&Self::table(), id)).await?;
        Ok(UpdateResult {
            update_data: Map::new(),
            count: rows.len() as u64,
            returning: rows.into_iter().next(),
        })
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    params: &[PgBindValue],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(row_to_camel_case(map))
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(at)) = row.try_get::<Option<chrono::DateTime<Utc>>, _>(name) {
        return Value::String(timestamp(at));
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// These need a reachable PostgreSQL: `DATABASE_URL=... cargo test -- --ignored`.
/// The employee table is created as a TEMP table on a single-connection pool,
/// so it shadows any real `employees` table and disappears with the pool.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Employee;
    use axum::http::StatusCode;
    use sqlx::postgres::PgPoolOptions;

    const EMPLOYEES_DDL: &str = r#"
        CREATE TEMP TABLE employees (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            middle_name TEXT,
            email TEXT UNIQUE,
            phone TEXT NOT NULL UNIQUE,
            address TEXT NOT NULL,
            job_title TEXT NOT NULL,
            created_at TIMESTAMPTZ,
            updated_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_by UUID,
            updated_by UUID,
            deleted_by UUID
        )
    "#;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
        PgPoolOptions::new().max_connections(1).connect(&url).await.unwrap()
    }

    fn employee(phone: &str) -> Employee {
        let body = json!({
            "firstName": "Abebe",
            "lastName": "Kebede",
            "phone": phone,
            "address": "12 Bole Road, Addis Ababa",
            "jobTitle": "chef"
        });
        let mut e = Employee::from_request(body.as_object().unwrap());
        e.audit.created_at = Some(Utc::now());
        e.audit.created_by = Some(Uuid::new_v4());
        e
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn row_to_json_maps_each_type_and_nulls() {
        let pool = pool().await;
        let row = sqlx::query(
            r#"SELECT 7::int2 AS small_n, NULL::int4 AS missing_n, 9000000000::int8 AS big_n,
                      2.5::float8 AS ratio, true AS is_active, NULL::uuid AS deleted_by,
                      '2024-01-02'::date AS day, '2024-01-02T03:04:05.678Z'::timestamptz AS created_at,
                      'x'::text AS label, NULL::text AS missing_label, '{"a":1}'::jsonb AS doc"#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let v = row_to_json(&row);
        assert_eq!(v["smallN"], 7);
        assert_eq!(v["missingN"], Value::Null);
        assert_eq!(v["bigN"], 9_000_000_000i64);
        assert_eq!(v["ratio"], 2.5);
        assert_eq!(v["isActive"], true);
        assert_eq!(v["deletedBy"], Value::Null);
        assert_eq!(v["day"], "2024-01-02");
        assert_eq!(v["createdAt"], "2024-01-02T03:04:05.678Z");
        assert_eq!(v["label"], "x");
        assert_eq!(v["missingLabel"], Value::Null);
        assert_eq!(v["doc"], json!({ "a": 1 }));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn crud_lifecycle_against_postgres() {
        let pool = pool().await;
        sqlx::query(EMPLOYEES_DDL).execute(&pool).await.unwrap();
        let service = CrudService::<Employee>::new(pool.clone());

        let row = service.insert(&employee("+254712345678")).await.unwrap();
        assert_eq!(row["firstName"], "Abebe");
        assert_eq!(row["middleName"], Value::Null);
        let id = Uuid::parse_str(row["id"].as_str().unwrap()).unwrap();

        let err = service.insert(&employee("+254712345678")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.kind(), Some(ErrorType::UniqueConstraintViolation));

        assert_eq!(service.read(id).await.unwrap().unwrap()["id"], id.to_string());
        assert_eq!(service.read_by_ids(&[id, Uuid::new_v4()]).await.unwrap().len(), 1);

        let mut change = Employee::from_request(json!({ "firstName": "Almaz" }).as_object().unwrap());
        change.audit.updated_at = Some(Utc::now());
        change.audit.updated_by = Some(Uuid::new_v4());
        assert_eq!(service.update(id, &change).await.unwrap().count, 1);
        let returned = service.update_and_return(id, &change).await.unwrap();
        assert_eq!(returned.returning.unwrap()["firstName"], "Almaz");
        assert_eq!(service.update_by_ids(&[id], &change).await.unwrap().count, 1);

        let by = Uuid::new_v4();
        let deleted = service.delete(id, by).await.unwrap();
        assert_eq!(deleted.count, 1);
        assert_eq!(deleted.update_data["deletedBy"], by.to_string());
        assert!(service.read(id).await.unwrap().is_none());
        assert_eq!(service.delete_by_ids(&[id], by).await.unwrap().count, 0);
        assert_eq!(service.update(id, &change).await.unwrap().count, 0);

        assert_eq!(service.delete_permanently(id).await.unwrap().count, 1);
        assert_eq!(service.delete_permanently(id).await.unwrap().count, 0);
    }
}
