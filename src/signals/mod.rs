//! External risk-signal collaborators
//!
//! Third-party explorers and security oracles are reached over HTTP. Every
//! call here is fallible; callers decide how to degrade.

mod explorer;
mod security_oracle;

pub use explorer::{EtherscanExplorer, EXPLORER_PAGE_SIZE};
pub use security_oracle::SecurityOracle;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::WalletAddress;

/// Failure talking to an external collaborator
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream timed out")]
    Timeout,

    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SignalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SignalError::Timeout
        } else if err.is_decode() {
            SignalError::Malformed(err.to_string())
        } else if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            SignalError::RateLimited(err.to_string())
        } else {
            SignalError::Unavailable(err.to_string())
        }
    }
}

/// A source that can independently flag a wallet as risky
#[async_trait]
pub trait RiskSignalSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// `Some(reason)` if the source flags the address, `None` if it does not
    async fn check(&self, address: &WalletAddress) -> Result<Option<String>, SignalError>;
}

/// One transaction as reported by an explorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerTx {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Value in wei, as reported
    pub value_wei: u128,
    pub is_error: bool,
    pub has_input: bool,
}

/// What an explorer knows about a wallet
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerActivity {
    /// The explorer answered but has no transactions for the address
    NoTransactions,
    Transactions(Vec<ExplorerTx>),
}

/// Blockchain explorer used for advisory tagging
#[async_trait]
pub trait ExplorerSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recent_activity(&self, address: &WalletAddress)
        -> Result<ExplorerActivity, SignalError>;
}
