//! HTTP handlers: the generic resource controller plus application-level endpoints.

pub mod common;
pub mod resource;
pub use resource::Controller;
