//! Generic resource controller and its axum handlers.
//!
//! The controller extracts and checks ids, builds the model from the body,
//! runs model validation, calls the repository and wraps the outcome in an
//! envelope. Every failure leaves through `AppError::normalize`.

use crate::error::{AppError, ErrorParts, ErrorType};
use crate::extractors::{AuthedUser, CurrentUser, USER_ID_HEADER};
use crate::fields::{is_empty, is_valid_uuid};
use crate::model::Model;
use crate::response::{count_meta, write_success};
use crate::service::{Repository, UpdateResult};
use crate::validation::ValidationError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

type QueryPairs = Option<Query<Vec<(String, String)>>>;

pub struct Controller<M: Model> {
    name: &'static str,
    repo: Arc<dyn Repository<M>>,
}

impl<M: Model> Controller<M> {
    pub fn new(repo: Arc<dyn Repository<M>>) -> Self {
        Controller { name: M::NAME, repo }
    }

    fn require_user(user: Option<&AuthedUser>) -> Result<&AuthedUser, AppError> {
        user.ok_or_else(|| {
            AppError::authentication(
                ErrorParts::default()
                    .kind(ErrorType::MissingToken)
                    .message("no token was provided in the request")
                    .details(json!({ "expectedLocation": format!("request.headers.{}", USER_ID_HEADER.to_lowercase()) })),
            )
        })
    }

    fn require_body(body: Option<Value>) -> Result<Map<String, Value>, AppError> {
        match body {
            Some(Value::Object(m)) if !m.is_empty() => Ok(m),
            Some(v) if !v.is_object() && !is_empty(Some(&v)) => Err(AppError::validation(vec![ValidationError::new(
                ErrorType::InvalidDataType,
                "body",
                Some(&v),
                "request body must be a JSON object",
            )
            .with_hint("send the data as a JSON object in request.body")])),
            _ => Err(AppError::validation(vec![ValidationError::new(
                ErrorType::MissingField,
                "body",
                Some(&json!({})),
                "no data was provided for write operation",
            )
            .with_hint("provide the data in request.body to proceed")])),
        }
    }

    fn missing_id(many: bool) -> AppError {
        let (field, empty, hint) = if many {
            ("ids", json!([]), "provide the ids in request.body or request.query to proceed")
        } else {
            ("id", json!(""), "provide the id in request.query to proceed")
        };
        AppError::validation(vec![ValidationError::new(
            ErrorType::MissingField,
            field,
            Some(&empty),
            format!("{} was not provided in the request", field),
        )
        .with_hint(hint)])
    }

    fn invalid_id(field: &str, raw: Value) -> AppError {
        let message = if raw.is_array() {
            "invalid ids were given"
        } else {
            "an invalid id was given"
        };
        AppError::validation(vec![ValidationError::new(ErrorType::InvalidDataType, field, Some(&raw), message)
            .with_hint("provide a valid id to proceed")])
    }

    fn not_found(&self, ids: &[Uuid]) -> AppError {
        let listed = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ");
        let which = if ids.len() > 1 { "the ids" } else { "an id" };
        AppError::not_found(
            ErrorParts::default().message(format!("no matching {} with {}: [{}] was found.", self.name, which, listed)),
        )
    }

    /// `id` from the query string; must be a canonical UUID.
    pub fn get_id(params: &[(String, String)]) -> Result<Uuid, AppError> {
        let raw = params
            .iter()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Self::missing_id(false))?;
        if !is_valid_uuid(raw) {
            return Err(Self::invalid_id("id", Value::String(raw.to_string())));
        }
        Uuid::try_parse(raw).map_err(|_| Self::invalid_id("id", Value::String(raw.to_string())))
    }

    /// `ids` from the query (`ids=a&ids=b`, `ids[]=a`, `ids=a,b`) or else from `body.ids`.
    pub fn get_ids(params: &[(String, String)], body: Option<&Value>) -> Result<Vec<Uuid>, AppError> {
        let mut raw: Vec<Value> = params
            .iter()
            .filter(|(k, _)| k == "ids" || k.starts_with("ids["))
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        if raw.is_empty() {
            match body.and_then(|b| b.get("ids")) {
                Some(Value::Array(items)) => raw = items.clone(),
                Some(single) if !is_empty(Some(single)) => raw = vec![single.clone()],
                _ => {}
            }
        }
        if raw.is_empty() {
            return Err(Self::missing_id(true));
        }
        let invalid: Vec<Value> = raw
            .iter()
            .filter(|v| !v.as_str().map(is_valid_uuid).unwrap_or(false))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(Self::invalid_id("ids", Value::Array(invalid)));
        }
        let ids = raw
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|s| Uuid::try_parse(s).ok())
            .collect();
        Ok(ids)
    }

    fn build_for_update(body: Option<Value>, user: &AuthedUser) -> Result<M, AppError> {
        let body = Self::require_body(body)?;
        let mut record = M::from_request(&body);
        let audit = record.audit_mut();
        audit.updated_at = Some(Utc::now());
        audit.updated_by = Some(user.id);
        let errors = record.validate_for_update();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(record)
    }

    fn ensure_found(&self, result: &UpdateResult, ids: &[Uuid]) -> Result<(), AppError> {
        if result.count == 0 {
            return Err(self.not_found(ids));
        }
        Ok(())
    }

    pub async fn create(&self, user: Option<&AuthedUser>, body: Option<Value>) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let body = Self::require_body(body)?;
        let mut record = M::from_request(&body);
        let audit = record.audit_mut();
        audit.created_at = Some(Utc::now());
        audit.created_by = Some(user.id);
        let errors = record.validate_for_insertion();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        let row = self.repo.insert(&record).await?;
        tracing::info!(resource = self.name, by = %user.id, "record created");
        Ok(write_success(
            StatusCode::CREATED,
            format!("{} created successfully.", self.name),
            row,
            None,
        ))
    }

    pub async fn read(&self, params: &[(String, String)]) -> Result<Response, AppError> {
        let id = Self::get_id(params)?;
        let row = self.repo.read(id).await?.ok_or_else(|| self.not_found(&[id]))?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} retrieved successfully", self.name),
            row,
            None,
        ))
    }

    pub async fn read_by_ids(&self, params: &[(String, String)], body: Option<&Value>) -> Result<Response, AppError> {
        let ids = Self::get_ids(params, body)?;
        let rows = self.repo.read_by_ids(&ids).await?;
        if rows.is_empty() {
            return Err(self.not_found(&ids));
        }
        let meta = count_meta(rows.len());
        Ok(write_success(
            StatusCode::OK,
            format!("{} retrieved successfully", self.name),
            rows,
            Some(meta),
        ))
    }

    pub async fn update(
        &self,
        user: Option<&AuthedUser>,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let id = Self::get_id(params)?;
        let record = Self::build_for_update(body, user)?;
        let result = self.repo.update(id, &record).await?;
        self.ensure_found(&result, &[id])?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} updated successfully", self.name),
            result,
            None,
        ))
    }

    pub async fn update_and_return(
        &self,
        user: Option<&AuthedUser>,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let id = Self::get_id(params)?;
        let record = Self::build_for_update(body, user)?;
        let result = self.repo.update_and_return(id, &record).await?;
        self.ensure_found(&result, &[id])?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} updated successfully", self.name),
            result,
            None,
        ))
    }

    pub async fn update_by_ids(
        &self,
        user: Option<&AuthedUser>,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let ids = Self::get_ids(params, body.as_ref())?;
        let record = Self::build_for_update(body, user)?;
        let result = self.repo.update_by_ids(&ids, &record).await?;
        self.ensure_found(&result, &ids)?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} updated successfully", self.name),
            result,
            None,
        ))
    }

    pub async fn delete(&self, user: Option<&AuthedUser>, params: &[(String, String)]) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let id = Self::get_id(params)?;
        let result = self.repo.delete(id, user.id).await?;
        self.ensure_found(&result, &[id])?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} deleted successfully", self.name),
            result,
            None,
        ))
    }

    pub async fn delete_by_ids(
        &self,
        user: Option<&AuthedUser>,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Response, AppError> {
        let user = Self::require_user(user)?;
        let ids = Self::get_ids(params, body)?;
        let result = self.repo.delete_by_ids(&ids, user.id).await?;
        self.ensure_found(&result, &ids)?;
        Ok(write_success(
            StatusCode::OK,
            format!("{} deleted successfully", self.name),
            result,
            None,
        ))
    }

    pub async fn delete_permanently(&self, params: &[(String, String)]) -> Result<Response, AppError> {
        let id = Self::get_id(params)?;
        let result = self.repo.delete_permanently(id).await?;
        self.ensure_found(&result, &[id])?;
        tracing::info!(resource = self.name, %id, "record permanently deleted");
        Ok(write_success(
            StatusCode::OK,
            format!("{} permanently deleted successfully", self.name),
            result,
            None,
        ))
    }
}

fn pairs(q: QueryPairs) -> Vec<(String, String)> {
    q.map(|Query(p)| p).unwrap_or_default()
}

fn json_body(body: Option<Json<Value>>) -> Option<Value> {
    body.map(|Json(v)| v)
}

pub async fn create<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    c.create(user.as_ref(), json_body(body)).await.map_err(AppError::normalize)
}

pub async fn read<M: Model>(State(c): State<Arc<Controller<M>>>, query: QueryPairs) -> Result<Response, AppError> {
    c.read(&pairs(query)).await.map_err(AppError::normalize)
}

pub async fn read_by_ids<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    query: QueryPairs,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    let body = json_body(body);
    c.read_by_ids(&pairs(query), body.as_ref())
        .await
        .map_err(AppError::normalize)
}

pub async fn update<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    query: QueryPairs,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    c.update(user.as_ref(), &pairs(query), json_body(body))
        .await
        .map_err(AppError::normalize)
}

pub async fn update_and_return<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    query: QueryPairs,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    c.update_and_return(user.as_ref(), &pairs(query), json_body(body))
        .await
        .map_err(AppError::normalize)
}

pub async fn update_by_ids<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    query: QueryPairs,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    c.update_by_ids(user.as_ref(), &pairs(query), json_body(body))
        .await
        .map_err(AppError::normalize)
}

pub async fn delete<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    query: QueryPairs,
) -> Result<Response, AppError> {
    c.delete(user.as_ref(), &pairs(query)).await.map_err(AppError::normalize)
}

pub async fn delete_by_ids<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    CurrentUser(user): CurrentUser,
    query: QueryPairs,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    let body = json_body(body);
    c.delete_by_ids(user.as_ref(), &pairs(query), body.as_ref())
        .await
        .map_err(AppError::normalize)
}

pub async fn delete_permanently<M: Model>(
    State(c): State<Arc<Controller<M>>>,
    query: QueryPairs,
) -> Result<Response, AppError> {
    c.delete_permanently(&pairs(query)).await.map_err(AppError::normalize)
}

pub async fn not_implemented() -> AppError {
    AppError::not_implemented(ErrorParts::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Employee;

    type C = Controller<Employee>;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const A: &str = "af953bc8-0821-4358-a4bc-1b60ec1c119f";
    const B: &str = "0f6c1b9e-4a1d-4c62-9d4e-3b7f2b8a9c10";

    #[test]
    fn id_missing_invalid_valid() {
        assert_eq!(C::get_id(&[]).unwrap_err().kind(), Some(ErrorType::MissingField));
        assert_eq!(C::get_id(&params(&[("id", " ")])).unwrap_err().kind(), Some(ErrorType::MissingField));

        let e = C::get_id(&params(&[("id", "abcdefghij")])).unwrap_err();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.kind(), Some(ErrorType::InvalidDataType));
        assert_eq!(e.errors[0].details.as_ref().unwrap()["keyValue"]["id"], "abcdefghij");

        assert_eq!(C::get_id(&params(&[("id", A)])).unwrap().to_string(), A);
    }

    #[test]
    fn ids_from_query_forms() {
        assert_eq!(C::get_ids(&params(&[("ids", A), ("ids", B)]), None).unwrap().len(), 2);
        assert_eq!(C::get_ids(&params(&[("ids[]", A)]), None).unwrap().len(), 1);
        let joined = format!("{},{}", A, B);
        assert_eq!(C::get_ids(&params(&[("ids", joined.as_str())]), None).unwrap().len(), 2);
    }

    #[test]
    fn ids_from_body() {
        let body = json!({ "ids": [A, B] });
        assert_eq!(C::get_ids(&[], Some(&body)).unwrap().len(), 2);
        let single = json!({ "ids": A });
        assert_eq!(C::get_ids(&[], Some(&single)).unwrap().len(), 1);
    }

    #[test]
    fn ids_missing_or_invalid() {
        let e = C::get_ids(&[], Some(&json!({ "ids": [] }))).unwrap_err();
        assert_eq!(e.kind(), Some(ErrorType::MissingField));
        assert_eq!(e.errors[0].details.as_ref().unwrap()["keyValue"]["ids"], json!([]));

        let e = C::get_ids(&params(&[("ids", A), ("ids", "nope")]), None).unwrap_err();
        assert_eq!(e.kind(), Some(ErrorType::InvalidDataType));
        assert_eq!(e.errors[0].details.as_ref().unwrap()["keyValue"]["ids"], json!(["nope"]));

        let e = C::get_ids(&[], Some(&json!({ "ids": [7] }))).unwrap_err();
        assert_eq!(e.kind(), Some(ErrorType::InvalidDataType));
    }

    #[test]
    fn body_must_be_non_empty_object() {
        assert_eq!(C::require_body(None).unwrap_err().kind(), Some(ErrorType::MissingField));
        assert_eq!(C::require_body(Some(json!({}))).unwrap_err().kind(), Some(ErrorType::MissingField));
        assert_eq!(C::require_body(Some(json!([1]))).unwrap_err().kind(), Some(ErrorType::InvalidDataType));
        assert!(C::require_body(Some(json!({ "firstName": "Abebe" }))).is_ok());
    }

    #[test]
    fn missing_user_is_unauthenticated() {
        let e = C::require_user(None).unwrap_err();
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
        assert_eq!(e.kind(), Some(ErrorType::MissingToken));
        assert_eq!(
            e.errors[0].details.as_ref().unwrap()["expectedLocation"],
            "request.headers.x-user-id"
        );
    }
}
