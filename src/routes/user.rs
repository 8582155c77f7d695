//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::user::{connect_wallet, get_user, list_user_wallets};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/:username", get(get_user))
        .route(
            "/api/users/:username/wallets",
            get(list_user_wallets).post(connect_wallet),
        )
}
