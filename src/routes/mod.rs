//! Route definitions for the Detectus API

mod admin;
mod analysis;
mod user;
mod wallet;

pub use admin::admin_routes;
pub use analysis::analysis_routes;
pub use user::user_routes;
pub use wallet::wallet_routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::handlers::health::{health_check, root};
use crate::middleware::{self, RateLimiter};
use crate::state::AppState;

/// Full application router with middleware applied
pub fn app_router(
    state: AppState,
    rate_limiter: RateLimiter,
    cors_allowed_origins: Option<&str>,
) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(user_routes())
        .merge(wallet_routes())
        .merge(analysis_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(cors_allowed_origins))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([middleware::REQUEST_ID_HEADER])
}
