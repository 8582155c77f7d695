//! Admin route definitions

use axum::{
    routing::{patch, post},
    Router,
};

use crate::handlers::admin::{seed_wallets, update_wallet};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/wallets/:address", patch(update_wallet))
        .route("/api/admin/seed", post(seed_wallets))
}
