//! Persistence collaborators for wallet and user records
//!
//! The core only needs find / upsert / atomic patch by address. Both stores
//! are injected as trait objects so tests can run against the in-memory one.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use axum::async_trait;

use crate::error::ApiError;
use crate::models::{
    RiskClassification, TransactionEvent, UserAccount, WalletAddress, WalletRecord,
};

/// Field-level update applied atomically by a [`WalletStore`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletPatch {
    pub trust_score: Option<i32>,
    pub risk: Option<RiskClassification>,
    pub frozen: Option<bool>,
    pub whitelist: Option<bool>,
    pub append_event: Option<TransactionEvent>,
    pub increment_unblacklist: bool,
    /// Merged with set semantics, keeping first-seen order
    pub add_tags: Vec<String>,
}

impl WalletPatch {
    pub fn is_empty(&self) -> bool {
        self.trust_score.is_none()
            && self.risk.is_none()
            && self.frozen.is_none()
            && self.whitelist.is_none()
            && self.append_event.is_none()
            && !self.increment_unblacklist
            && self.add_tags.is_empty()
    }

    /// Apply this patch to an in-memory record
    pub fn apply_to(&self, record: &mut WalletRecord) {
        if let Some(score) = self.trust_score {
            record.trust_score = score;
        }
        if let Some(risk) = self.risk {
            record.risk = risk;
        }
        if let Some(frozen) = self.frozen {
            record.frozen = frozen;
        }
        if let Some(whitelist) = self.whitelist {
            record.whitelist = whitelist;
        }
        if let Some(event) = &self.append_event {
            record.history.push(event.clone());
        }
        if self.increment_unblacklist {
            record.unblacklist_count += 1;
        }
        merge_tags(&mut record.tags, &self.add_tags);
        record.updated_at = chrono::Utc::now();
    }
}

/// Union `incoming` into `tags` without duplicates
pub fn merge_tags(tags: &mut Vec<String>, incoming: &[String]) {
    for tag in incoming {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
}

/// Key-value-by-address store for wallet records
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn find(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, ApiError>;

    /// Return the existing record or create one with defaults
    async fn upsert(
        &self,
        address: &WalletAddress,
        initial_owner: Option<&str>,
    ) -> Result<WalletRecord, ApiError>;

    /// Apply `patch` atomically; fails with `NotFound` if no record exists
    async fn apply_update(
        &self,
        address: &WalletAddress,
        patch: WalletPatch,
    ) -> Result<WalletRecord, ApiError>;

    async fn list_by_owner(&self, username: &str) -> Result<Vec<WalletRecord>, ApiError>;

    async fn health_check(&self) -> Result<(), ApiError>;
}

/// User accounts owned by the credential service
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserAccount>, ApiError>;

    /// Create the account if it does not exist yet
    async fn create_user(&self, username: &str) -> Result<UserAccount, ApiError>;

    /// Link a wallet to a user; returns false if the link already existed
    async fn link_wallet(&self, username: &str, address: &WalletAddress)
        -> Result<bool, ApiError>;
}
