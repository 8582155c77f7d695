//! Detectus Backend Server
//!
//! Tracks per-wallet trust scores and risk classifications, analyzes
//! transaction history and combines internal state with external risk signals.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use detectus_server::config::Config;
use detectus_server::db;
use detectus_server::middleware::RateLimiter;
use detectus_server::routes;
use detectus_server::services::{RiskCheckService, WalletService};
use detectus_server::signals::{
    EtherscanExplorer, ExplorerSource, RiskSignalSource, SecurityOracle,
};
use detectus_server::state::AppState;
use detectus_server::store::{InMemoryStore, PgStore, UserStore, WalletStore};

/// How often idle rate-limit buckets are evicted
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Detectus server");

    let (wallet_store, user_store) = build_stores(&config).await?;
    let timeout = config.signal_timeout();

    let explorer: Option<Arc<dyn ExplorerSource>> = match &config.explorer_api_key {
        Some(api_key) => Some(Arc::new(EtherscanExplorer::new(
            config.explorer_api_url.clone(),
            api_key.clone(),
            timeout,
        ))),
        None => {
            tracing::warn!("EXPLORER_API_KEY not set, wallet enrichment is disabled");
            None
        }
    };

    let sources: Vec<Arc<dyn RiskSignalSource>> = vec![Arc::new(SecurityOracle::new(
        config.security_oracle_url.clone(),
        config.security_oracle_chain_id.clone(),
        timeout,
    ))];

    let wallet_service = Arc::new(WalletService::new(
        wallet_store.clone(),
        user_store,
        explorer,
        timeout,
    ));
    let risk_check_service = Arc::new(RiskCheckService::new(wallet_store, sources, timeout));

    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, admin routes are disabled");
    }

    let app_state = AppState::new(
        wallet_service,
        risk_check_service,
        config.admin_token.clone(),
        config.environment,
    );

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let sweeper = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sweeper.evict_idle(RATE_LIMIT_SWEEP_INTERVAL).await;
            tracing::debug!(evicted, "Swept idle rate limit buckets");
        }
    });

    let app = routes::app_router(
        app_state,
        rate_limiter,
        config.cors_allowed_origins.as_deref(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Postgres when DATABASE_URL is set, otherwise the in-memory store
async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn WalletStore>, Arc<dyn UserStore>)> {
    match &config.database_url {
        Some(database_url) => {
            let masked = config.database_url_masked().unwrap_or_default();
            let pool = db::create_pool(database_url, &masked, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;

            let store = Arc::new(PgStore::new(pool));
            let wallets: Arc<dyn WalletStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((wallets, users))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data will not persist");
            let store = Arc::new(InMemoryStore::new());
            let wallets: Arc<dyn WalletStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((wallets, users))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
