//! User account HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{ApiResponse, ConnectWalletRequest, UserAccount, WalletAddress, WalletRecord};
use crate::services::{ConnectOutcome, WalletService};

/// GET /api/users/:username
pub async fn get_user(
    State(wallet_service): State<Arc<WalletService>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserAccount>>, ApiError> {
    let user = wallet_service.get_user(&username).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// POST /api/users/:username/wallets - 201 on a new link, 200 if already connected
pub async fn connect_wallet(
    State(wallet_service): State<Arc<WalletService>>,
    Path(username): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ConnectWalletRequest>, ApiError>,
) -> Result<(StatusCode, Json<ApiResponse<ConnectOutcome>>), ApiError> {
    req.validate()?;
    let address = WalletAddress::parse(&req.address)?;

    let outcome = wallet_service.connect_wallet(&username, &address).await?;
    let status = if outcome.newly_linked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(ApiResponse::ok(outcome))))
}

/// GET /api/users/:username/wallets
pub async fn list_user_wallets(
    State(wallet_service): State<Arc<WalletService>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<WalletRecord>>>, ApiError> {
    let wallets = wallet_service.list_user_wallets(&username).await?;
    Ok(Json(ApiResponse::ok(wallets)))
}
