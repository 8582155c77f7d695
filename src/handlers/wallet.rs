//! Wallet HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{ApiResponse, RecordTransactionRequest, WalletAddress, WalletRecord};
use crate::services::{EnrichmentOutcome, TransactionOutcome, WalletService};

/// GET /api/wallets/:address
pub async fn get_wallet(
    State(wallet_service): State<Arc<WalletService>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletRecord>>, ApiError> {
    let address = WalletAddress::parse(&address)?;
    let wallet = wallet_service.get_wallet(&address).await?;
    Ok(Json(ApiResponse::ok(wallet)))
}

/// POST /api/wallets/:address/transactions - Score and record a transaction
pub async fn record_transaction(
    State(wallet_service): State<Arc<WalletService>>,
    Path(address): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<RecordTransactionRequest>, ApiError>,
) -> Result<Json<ApiResponse<TransactionOutcome>>, ApiError> {
    let address = WalletAddress::parse(&address)?;
    let outcome = wallet_service.record_transaction(&address, req).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/wallets/:address/appeal
pub async fn appeal(
    State(wallet_service): State<Arc<WalletService>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletRecord>>, ApiError> {
    let address = WalletAddress::parse(&address)?;
    let wallet = wallet_service.appeal(&address).await?;
    Ok(Json(ApiResponse::ok(wallet)))
}

/// POST /api/wallets/:address/enrich - Tag the wallet from explorer data
pub async fn enrich(
    State(wallet_service): State<Arc<WalletService>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<EnrichmentOutcome>>, ApiError> {
    let address = WalletAddress::parse(&address)?;
    let outcome = wallet_service.enrich(&address).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
