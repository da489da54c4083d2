//! Generic CRUD service: the `Repository` seam and its PostgreSQL implementation.

mod crud;

pub use crud::CrudService;

use crate::error::AppError;
use crate::model::Model;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Outcome of a write that is not an insert.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Values written, keyed by API field name.
    pub update_data: Map<String, Value>,
    /// Rows affected.
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returning: Option<Value>,
}

/// CRUD over one resource table. Rows come back as JSON objects with API
/// (camelCase) keys. Soft-deleted rows are invisible to everything except
/// `delete_permanently`.
#[async_trait]
pub trait Repository<M: Model>: Send + Sync {
    async fn insert(&self, record: &M) -> Result<Value, AppError>;

    async fn read(&self, id: Uuid) -> Result<Option<Value>, AppError>;

    async fn read_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Value>, AppError>;

    async fn update(&self, id: Uuid, record: &M) -> Result<UpdateResult, AppError>;

    async fn update_and_return(&self, id: Uuid, record: &M) -> Result<UpdateResult, AppError>;

    async fn update_by_ids(&self, ids: &[Uuid], record: &M) -> Result<UpdateResult, AppError>;

    async fn delete(&self, id: Uuid, deleted_by: Uuid) -> Result<UpdateResult, AppError>;

    async fn delete_by_ids(&self, ids: &[Uuid], deleted_by: Uuid) -> Result<UpdateResult, AppError>;

    async fn delete_permanently(&self, id: Uuid) -> Result<UpdateResult, AppError>;
}
