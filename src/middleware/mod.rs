//! Middleware for the Detectus API
//!
//! Request tracing, rate limiting, security headers and admin authentication.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::AdminUser;
pub use rate_limiter::{rate_limit, RateLimiter};
pub use security::security_headers;
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};

use axum::extract::Request;

/// Best-effort client address from proxy headers
pub(crate) fn client_ip(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
