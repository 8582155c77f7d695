//! Wallet trust-tracking service
//!
//! Orchestrates the store collaborators, the scoring engine and the explorer.
//! Every state transition goes through [`WalletStore::apply_update`] so the
//! store decides atomicity; this layer never holds a lock across calls.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    normalize_username, AdminWalletUpdate, RecordTransactionRequest, UserAccount, WalletAddress,
    WalletRecord,
};
use crate::services::enrichment::derive_tags;
use crate::services::report::{generate_report, unavailable_report, AnalysisReport};
use crate::services::scoring::{ScoreDecision, ScoringEngine, TransactionFacts};
use crate::signals::{ExplorerSource, SignalError};
use crate::store::{UserStore, WalletPatch, WalletStore};

/// Result of recording a transaction
#[derive(Debug, Serialize, Clone)]
pub struct TransactionOutcome {
    pub wallet: WalletRecord,
    pub decision: ScoreDecision,
}

/// Result of connecting a wallet to a user
#[derive(Debug, Serialize, Clone)]
pub struct ConnectOutcome {
    pub wallet: WalletRecord,
    /// False when the wallet was already connected to this user
    pub newly_linked: bool,
}

/// Result of an enrichment pass
#[derive(Debug, Serialize, Clone)]
pub struct EnrichmentOutcome {
    pub wallet: WalletRecord,
    pub suggested_tags: Vec<String>,
    /// False when the explorer was disabled, failed or timed out
    pub source_available: bool,
}

#[derive(Clone)]
pub struct WalletService {
    wallets: Arc<dyn WalletStore>,
    users: Arc<dyn UserStore>,
    explorer: Option<Arc<dyn ExplorerSource>>,
    engine: ScoringEngine,
    signal_timeout: Duration,
}

impl WalletService {
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        users: Arc<dyn UserStore>,
        explorer: Option<Arc<dyn ExplorerSource>>,
        signal_timeout: Duration,
    ) -> Self {
        Self {
            wallets,
            users,
            explorer,
            engine: ScoringEngine::new(),
            signal_timeout,
        }
    }

    pub async fn get_wallet(&self, address: &WalletAddress) -> Result<WalletRecord, ApiError> {
        self.wallets
            .find(address)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Wallet {} not found", address)))
    }

    /// Score a transaction server-side and append it to the wallet's history
    pub async fn record_transaction(
        &self,
        address: &WalletAddress,
        request: RecordTransactionRequest,
    ) -> Result<TransactionOutcome, ApiError> {
        request.validate()?;
        let recipient = WalletAddress::parse(&request.recipient)?;

        let record = self.get_wallet(address).await?;
        let counterparty = if recipient == *address {
            None
        } else {
            self.wallets.find(&recipient).await?
        };

        let facts = TransactionFacts {
            amount: request.amount,
            recipient,
            tx_hash: request.tx_hash,
        };
        let (patch, decision) =
            self.engine
                .transaction_patch(&record, &facts, counterparty.as_ref())?;

        let wallet = self.wallets.apply_update(address, patch).await?;

        info!(
            address = %address,
            recipient = %facts.recipient,
            score_impact = decision.score_impact,
            trust_score = wallet.trust_score,
            risk_level = wallet.risk_level().as_str(),
            "Transaction recorded"
        );

        Ok(TransactionOutcome { wallet, decision })
    }

    /// Reset score and level after an appeal; never creates a record
    pub async fn appeal(&self, address: &WalletAddress) -> Result<WalletRecord, ApiError> {
        let wallet = self
            .wallets
            .apply_update(address, self.engine.appeal_patch())
            .await?;

        info!(
            address = %address,
            unblacklist_count = wallet.unblacklist_count,
            "Wallet appeal granted"
        );
        Ok(wallet)
    }

    pub async fn admin_update(
        &self,
        address: &WalletAddress,
        update: AdminWalletUpdate,
    ) -> Result<WalletRecord, ApiError> {
        update.validate()?;
        let patch = self.engine.admin_patch(&update)?;
        let wallet = self.wallets.apply_update(address, patch).await?;

        info!(
            address = %address,
            trust_score = ?update.trust_score,
            risk_level = ?update.risk_level,
            frozen = ?update.frozen,
            whitelist = ?update.whitelist,
            "Admin override applied"
        );
        Ok(wallet)
    }

    /// Create the wallet if needed and link it to `username`; idempotent
    pub async fn connect_wallet(
        &self,
        username: &str,
        address: &WalletAddress,
    ) -> Result<ConnectOutcome, ApiError> {
        let username = normalize_username(username)?;
        if self.users.find_user(&username).await?.is_none() {
            return Err(ApiError::NotFound(format!("User {} not found", username)));
        }

        let wallet = self.wallets.upsert(address, Some(&username)).await?;
        let newly_linked = self.users.link_wallet(&username, address).await?;

        if newly_linked {
            info!(address = %address, username = %username, "Wallet connected");
        }
        Ok(ConnectOutcome {
            wallet,
            newly_linked,
        })
    }

    pub async fn get_user(&self, username: &str) -> Result<UserAccount, ApiError> {
        let username = normalize_username(username)?;
        self.users
            .find_user(&username)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))
    }

    pub async fn list_user_wallets(&self, username: &str) -> Result<Vec<WalletRecord>, ApiError> {
        let user = self.get_user(username).await?;
        self.wallets.list_by_owner(&user.username).await
    }

    /// Narrative analysis; degrades to an informational report instead of failing
    pub async fn analyze(&self, address: &WalletAddress) -> AnalysisReport {
        match self.wallets.find(address).await {
            Ok(record) => generate_report(address, record.as_ref()),
            Err(e) => {
                warn!(address = %address, error = %e, "Wallet store unavailable during analysis");
                unavailable_report(address)
            }
        }
    }

    /// Return the wallet, creating it with defaults if it does not exist
    pub async fn ensure_wallet(&self, address: &WalletAddress) -> Result<WalletRecord, ApiError> {
        self.wallets.upsert(address, None).await
    }

    /// Union explorer-derived tags into the wallet, upserting it first
    pub async fn enrich(&self, address: &WalletAddress) -> Result<EnrichmentOutcome, ApiError> {
        let wallet = self.ensure_wallet(address).await?;

        let Some(explorer) = &self.explorer else {
            return Ok(EnrichmentOutcome {
                wallet,
                suggested_tags: Vec::new(),
                source_available: false,
            });
        };

        let activity = tokio::time::timeout(self.signal_timeout, explorer.recent_activity(address))
            .await
            .unwrap_or(Err(SignalError::Timeout));

        let tags = match activity {
            Ok(activity) => derive_tags(&activity),
            Err(e) => {
                warn!(
                    address = %address,
                    source = explorer.name(),
                    error = %e,
                    "Explorer unavailable, skipping enrichment"
                );
                return Ok(EnrichmentOutcome {
                    wallet,
                    suggested_tags: Vec::new(),
                    source_available: false,
                });
            }
        };

        let wallet = if tags.is_empty() {
            wallet
        } else {
            let patch = WalletPatch {
                add_tags: tags.clone(),
                ..Default::default()
            };
            self.wallets.apply_update(address, patch).await?
        };

        info!(address = %address, tags = ?tags, "Wallet enriched");
        Ok(EnrichmentOutcome {
            wallet,
            suggested_tags: tags,
            source_available: true,
        })
    }

    /// Liveness of the wallet store
    pub async fn health_check(&self) -> Result<(), ApiError> {
        self.wallets.health_check().await
    }

    pub(crate) fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }
}
