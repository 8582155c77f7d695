//! Risk analysis route definitions

use axum::{routing::get, Router};

use crate::handlers::analysis::{analyze_wallet, risk_check};
use crate::state::AppState;

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallets/:address/analysis", get(analyze_wallet))
        .route("/api/wallets/:address/risk-check", get(risk_check))
}
