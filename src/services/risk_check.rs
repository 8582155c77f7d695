//! Multi-source scam determination
//!
//! OR-combines internal wallet state with external signal sources. External
//! sources run concurrently, each under its own timeout, and any failure is
//! logged and treated as "no flag". This check never fails.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{ScamCheck, WalletAddress, WalletRecord};
use crate::signals::{RiskSignalSource, SignalError};
use crate::store::WalletStore;

/// Internal scores below this count as a scam signal.
///
/// Deliberately independent of the report tiers.
const SCAM_SCORE_THRESHOLD: i32 = 200;

const SAFE_DETAILS: &str = "No risk signals detected";

/// Combines the wallet store with external risk signal sources
pub struct RiskCheckService {
    wallets: Arc<dyn WalletStore>,
    sources: Vec<Arc<dyn RiskSignalSource>>,
    timeout: Duration,
}

impl RiskCheckService {
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        sources: Vec<Arc<dyn RiskSignalSource>>,
        timeout: Duration,
    ) -> Self {
        Self {
            wallets,
            sources,
            timeout,
        }
    }

    /// Run every signal and fold the results into one determination
    pub async fn check(&self, address: &WalletAddress) -> ScamCheck {
        let internal = match self.wallets.find(address).await {
            Ok(Some(record)) => internal_signals(&record),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(address = %address, error = %e, "Wallet store unavailable during risk check");
                Vec::new()
            }
        };

        let external = join_all(
            self.sources
                .iter()
                .map(|source| self.query_source(source.as_ref(), address)),
        )
        .await;

        let reasons: Vec<String> = internal
            .into_iter()
            .chain(external.into_iter().flatten())
            .collect();

        let is_scam = !reasons.is_empty();
        debug!(address = %address, is_scam, signals = reasons.len(), "Risk check complete");

        ScamCheck {
            address: address.to_string(),
            is_scam,
            details: if is_scam {
                reasons.join("; ")
            } else {
                SAFE_DETAILS.to_string()
            },
        }
    }

    async fn query_source(
        &self,
        source: &dyn RiskSignalSource,
        address: &WalletAddress,
    ) -> Option<String> {
        let outcome = tokio::time::timeout(self.timeout, source.check(address))
            .await
            .unwrap_or(Err(SignalError::Timeout));

        match outcome {
            Ok(flag) => flag,
            Err(e) => {
                warn!(
                    address = %address,
                    source = source.name(),
                    error = %e,
                    "External risk signal unavailable, ignoring"
                );
                None
            }
        }
    }
}

/// Answer for input that is not a usable wallet address.
///
/// No record can exist for it and external sources are not queried with it.
pub fn unrecognized_check(raw: &str) -> ScamCheck {
    ScamCheck {
        address: raw.trim().to_lowercase(),
        is_scam: false,
        details: SAFE_DETAILS.to_string(),
    }
}

/// Reasons the wallet's own state marks it as a scam
pub fn internal_signals(record: &WalletRecord) -> Vec<String> {
    let mut reasons = Vec::new();
    if record.frozen {
        reasons.push("frozen by admin".to_string());
    }
    if !record.whitelist && record.trust_score < SCAM_SCORE_THRESHOLD {
        reasons.push("very low internal trust score".to_string());
    }
    reasons
}
