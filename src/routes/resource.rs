//! Fixed CRUD route table for one resource.
//! Paths are relative; the caller nests them under the resource prefix.

use crate::handlers::resource::{
    create, delete as delete_handler, delete_by_ids, delete_permanently, not_implemented, read,
    read_by_ids, update, update_and_return, update_by_ids, Controller,
};
use crate::model::Model;
use axum::{
    routing::{delete, patch, post},
    Router,
};
use std::sync::Arc;

pub fn resource_routes<M: Model>(controller: Arc<Controller<M>>) -> Router {
    Router::new()
        .route(
            "/",
            post(create::<M>)
                .get(read::<M>)
                .patch(update::<M>)
                .delete(delete_handler::<M>),
        )
        .route("/bulk", post(not_implemented))
        .route(
            "/ids",
            post(read_by_ids::<M>)
                .get(read_by_ids::<M>)
                .patch(update_by_ids::<M>)
                .delete(delete_by_ids::<M>),
        )
        .route(
            "/filter",
            post(not_implemented).get(not_implemented).patch(not_implemented),
        )
        .route("/search", post(not_implemented).get(not_implemented))
        .route("/returning", patch(update_and_return::<M>))
        .route("/return", patch(update_and_return::<M>))
        .route("/update_and_find", patch(update_and_return::<M>))
        .route("/permanently", delete(delete_permanently::<M>))
        .with_state(controller)
}
