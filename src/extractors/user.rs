//! Extract the calling user from the request (`X-User-Id` header).
//!
//! The header is trusted as set by an upstream gateway; no credential check
//! happens here.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::fields::is_valid_uuid;

/// Header carrying the caller's employee id.
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: Uuid,
}

/// Caller identity, `None` when the header is absent or not a canonical UUID.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<AuthedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| is_valid_uuid(s))
            .and_then(|s| Uuid::try_parse(s).ok())
            .map(|id| AuthedUser { id });
        if user.is_none() && parts.headers.contains_key(USER_ID_HEADER) {
            tracing::debug!("ignoring malformed {} header", USER_ID_HEADER);
        }
        Ok(CurrentUser(user))
    }
}
