//! Banner and health endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::services::WalletService;

pub async fn root() -> &'static str {
    "Detectus API Server"
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: String,
    pub version: &'static str,
}

/// GET /health - 503 when the wallet store is unreachable
pub async fn health_check(
    State(wallet_service): State<Arc<WalletService>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, store) = match wallet_service.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                "unreachable".to_string(),
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            store,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
