//! Risk analysis handlers
//!
//! Both endpoints degrade instead of failing. An address that cannot be
//! parsed gets the informational answer for an unknown wallet.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::models::{ApiResponse, ScamCheck, WalletAddress};
use crate::services::report::{unrecognized_report, AnalysisReport};
use crate::services::risk_check::unrecognized_check;
use crate::services::{RiskCheckService, WalletService};

/// GET /api/wallets/:address/analysis
pub async fn analyze_wallet(
    State(wallet_service): State<Arc<WalletService>>,
    Path(raw): Path<String>,
) -> Json<ApiResponse<AnalysisReport>> {
    let report = match WalletAddress::parse(&raw) {
        Ok(address) => wallet_service.analyze(&address).await,
        Err(e) => {
            tracing::debug!(address = %raw, error = %e, "Unrecognized address, reporting as unknown");
            unrecognized_report(&raw)
        }
    };
    Json(ApiResponse::ok(report))
}

/// GET /api/wallets/:address/risk-check
pub async fn risk_check(
    State(risk_check_service): State<Arc<RiskCheckService>>,
    Path(raw): Path<String>,
) -> Json<ApiResponse<ScamCheck>> {
    let result = match WalletAddress::parse(&raw) {
        Ok(address) => risk_check_service.check(&address).await,
        Err(e) => {
            tracing::debug!(address = %raw, error = %e, "Unrecognized address, no signals apply");
            unrecognized_check(&raw)
        }
    };
    Json(ApiResponse::ok(result))
}
