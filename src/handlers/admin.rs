//! Admin HTTP handlers
//!
//! Every handler here takes [`AdminUser`], so requests without the
//! configured bearer token never reach the service.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use crate::error::ApiError;
use crate::handlers::AdminUser;
use crate::models::{AdminWalletUpdate, ApiResponse, WalletAddress, WalletRecord};
use crate::services::seed::{self, SeedRequest, SeedSummary};
use crate::services::WalletService;
use crate::state::AdminAccess;

/// PATCH /api/admin/wallets/:address - Set any subset of score, level and flags
pub async fn update_wallet(
    _admin: AdminUser,
    State(wallet_service): State<Arc<WalletService>>,
    Path(address): Path<String>,
    WithRejection(Json(update), _): WithRejection<Json<AdminWalletUpdate>, ApiError>,
) -> Result<Json<ApiResponse<WalletRecord>>, ApiError> {
    let address = WalletAddress::parse(&address)?;
    let wallet = wallet_service.admin_update(&address, update).await?;
    Ok(Json(ApiResponse::ok(wallet)))
}

/// POST /api/admin/seed - Development fixture generation
pub async fn seed_wallets(
    _admin: AdminUser,
    State(access): State<AdminAccess>,
    State(wallet_service): State<Arc<WalletService>>,
    WithRejection(Json(req), _): WithRejection<Json<SeedRequest>, ApiError>,
) -> Result<Json<ApiResponse<SeedSummary>>, ApiError> {
    if access.environment.is_production() {
        return Err(ApiError::Forbidden(
            "Seeding is disabled in production".to_string(),
        ));
    }

    let summary = seed::seed(&wallet_service, req).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
