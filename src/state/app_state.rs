//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Environment;
use crate::services::{RiskCheckService, WalletService};

/// Admin access settings checked by the `AdminUser` extractor
#[derive(Clone, Debug)]
pub struct AdminAccess {
    /// No token configured means admin routes are closed
    pub token: Option<Arc<str>>,
    pub environment: Environment,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub wallet_service: Arc<WalletService>,
    pub risk_check_service: Arc<RiskCheckService>,
    pub admin: AdminAccess,
}

impl AppState {
    pub fn new(
        wallet_service: Arc<WalletService>,
        risk_check_service: Arc<RiskCheckService>,
        admin_token: Option<String>,
        environment: Environment,
    ) -> Self {
        Self {
            wallet_service,
            risk_check_service,
            admin: AdminAccess {
                token: admin_token.map(Arc::from),
                environment,
            },
        }
    }
}

impl FromRef<AppState> for Arc<WalletService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.wallet_service.clone()
    }
}

impl FromRef<AppState> for Arc<RiskCheckService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.risk_check_service.clone()
    }
}

impl FromRef<AppState> for AdminAccess {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.admin.clone()
    }
}
