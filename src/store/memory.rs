//! In-memory store used for tests and local development

use axum::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{UserStore, WalletPatch, WalletStore};
use crate::error::ApiError;
use crate::models::{UserAccount, WalletAddress, WalletRecord};

/// Wallets and users behind async read-write locks.
///
/// Each patch is applied under the write lock, which gives the same
/// atomic update-by-key behavior the Postgres store gets from a single UPDATE.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    wallets: Arc<RwLock<HashMap<String, WalletRecord>>>,
    users: Arc<RwLock<HashMap<String, UserAccount>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored wallet records
    pub async fn wallet_count(&self) -> usize {
        self.wallets.read().await.len()
    }

    /// Insert or replace a record verbatim, bypassing the engine
    pub async fn put_wallet(&self, record: WalletRecord) {
        self.wallets
            .write()
            .await
            .insert(record.address.as_str().to_string(), record);
    }
}

#[async_trait]
impl WalletStore for InMemoryStore {
    async fn find(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, ApiError> {
        Ok(self.wallets.read().await.get(address.as_str()).cloned())
    }

    async fn upsert(
        &self,
        address: &WalletAddress,
        initial_owner: Option<&str>,
    ) -> Result<WalletRecord, ApiError> {
        let mut wallets = self.wallets.write().await;
        let record = wallets
            .entry(address.as_str().to_string())
            .or_insert_with(|| WalletRecord::new(address.clone(), None));
        if record.owner_username.is_none() {
            record.owner_username = initial_owner.map(str::to_string);
        }
        Ok(record.clone())
    }

    async fn apply_update(
        &self,
        address: &WalletAddress,
        patch: WalletPatch,
    ) -> Result<WalletRecord, ApiError> {
        let mut wallets = self.wallets.write().await;
        let record = wallets
            .get_mut(address.as_str())
            .ok_or_else(|| ApiError::NotFound(format!("Wallet {} not found", address)))?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    async fn list_by_owner(&self, username: &str) -> Result<Vec<WalletRecord>, ApiError> {
        let users = self.users.read().await;
        let wallets = self.wallets.read().await;
        let addresses = users
            .get(username)
            .map(|u| u.wallets.clone())
            .unwrap_or_default();
        Ok(addresses
            .iter()
            .filter_map(|a| wallets.get(a).cloned())
            .collect())
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserAccount>, ApiError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create_user(&self, username: &str) -> Result<UserAccount, ApiError> {
        let mut users = self.users.write().await;
        let user = users
            .entry(username.to_string())
            .or_insert_with(|| UserAccount::new(username.to_string()));
        Ok(user.clone())
    }

    async fn link_wallet(
        &self,
        username: &str,
        address: &WalletAddress,
    ) -> Result<bool, ApiError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))?;
        if user.wallets.iter().any(|w| w == address.as_str()) {
            return Ok(false);
        }
        user.wallets.push(address.as_str().to_string());
        Ok(true)
    }
}
