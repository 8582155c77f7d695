//! Admin authentication
//!
//! Admin routes take a static bearer token from configuration. With no token
//! configured they are closed entirely.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::ApiError;
use crate::state::AdminAccess;

/// Proof that the request carried the configured admin token
#[derive(Debug, Clone, Copy)]
pub struct AdminUser;

/// Compare without short-circuiting on the first differing byte
fn tokens_match(expected: &[u8], provided: &[u8]) -> bool {
    expected.len() == provided.len()
        && expected
            .iter()
            .zip(provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AdminAccess: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access = AdminAccess::from_ref(state);

        let Some(expected) = access.token else {
            return Err(ApiError::Forbidden(
                "Admin access is not configured".to_string(),
            ));
        };

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        if !tokens_match(expected.as_bytes(), bearer.token().as_bytes()) {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request with invalid token");
            return Err(ApiError::Unauthorized("Invalid admin token".to_string()));
        }

        Ok(AdminUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"secret", b"secret"));
        assert!(!tokens_match(b"secret", b"secreT"));
        assert!(!tokens_match(b"secret", b"secret-longer"));
        assert!(!tokens_match(b"secret", b""));
    }
}
