//! Caller identity. There is no real authentication: the caller's user id arrives in
//! the `x-user-id` header and is trusted as-is.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts the caller's user id, rejecting with 401 when it is missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing user ID".to_string()))?;

        Uuid::parse_str(raw)
            .map(CallerId)
            .map_err(|_| AppError::Unauthorized("invalid user ID".to_string()))
    }
}
