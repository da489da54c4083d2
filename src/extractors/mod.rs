//! Request extractors.

pub mod user;
pub use user::{AuthedUser, CurrentUser, USER_ID_HEADER};
