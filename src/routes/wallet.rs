//! Wallet route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::wallet::{appeal, enrich, get_wallet, record_transaction};
use crate::state::AppState;

pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallets/:address", get(get_wallet))
        .route("/api/wallets/:address/transactions", post(record_transaction))
        .route("/api/wallets/:address/appeal", post(appeal))
        .route("/api/wallets/:address/enrich", post(enrich))
}
