//! Hotel API: generic CRUD REST backend over PostgreSQL.
//!
//! Each resource is a [`Model`] (columns, rules, field exclusions) served by a
//! [`CrudService`] behind the [`Repository`] trait and exposed through a
//! generic [`Controller`] and a fixed route table.

pub mod case;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod fields;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use config::{load_env_files, Settings};
pub use db::{connect, ensure_database_exists};
pub use error::{AppError, ConfigError, ErrorType};
pub use handlers::Controller;
pub use model::{Employee, Model};
pub use response::{write_error, write_success, Envelope};
pub use routes::{app, layered, ready_routes};
pub use service::{CrudService, Repository, UpdateResult};
pub use state::AppState;
pub use telemetry::init_tracing;
