//! Development fixture generation
//!
//! Creates random wallets and pushes random transactions through the normal
//! service path. Not part of the serving path and refused in production.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{AdminWalletUpdate, RecordTransactionRequest, WalletAddress};
use crate::services::wallet::WalletService;

/// Owner of every seeded wallet
pub const SEED_USERNAME: &str = "seed@detectus.dev";

const FROZEN_RATIO: f64 = 0.1;

#[derive(Debug, Deserialize, Validate)]
pub struct SeedRequest {
    #[validate(range(min = 1, max = 500))]
    pub wallets: usize,
    #[validate(range(max = 200))]
    #[serde(default = "default_transactions_per_wallet")]
    pub transactions_per_wallet: usize,
}

fn default_transactions_per_wallet() -> usize {
    10
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub owner: String,
    pub wallets_created: usize,
    pub transactions_recorded: usize,
    pub frozen: usize,
}

struct SeedPlan {
    addresses: Vec<WalletAddress>,
    /// (sender index, recipient index, amount)
    transactions: Vec<(usize, usize, f64)>,
    frozen: Vec<usize>,
}

fn random_address(rng: &mut impl Rng) -> Result<WalletAddress, ApiError> {
    let bytes: [u8; 20] = rng.gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    WalletAddress::parse(&format!("0x{}", hex))
}

fn plan(request: &SeedRequest, rng: &mut impl Rng) -> Result<SeedPlan, ApiError> {
    let addresses = (0..request.wallets)
        .map(|_| random_address(rng))
        .collect::<Result<Vec<_>, _>>()?;

    let mut transactions = Vec::with_capacity(request.wallets * request.transactions_per_wallet);
    for sender in 0..request.wallets {
        for _ in 0..request.transactions_per_wallet {
            let recipient = rng.gen_range(0..request.wallets);
            // Mostly small transfers with the occasional large one
            let amount = if rng.gen_bool(0.05) {
                rng.gen_range(10_000.0..250_000.0)
            } else {
                rng.gen_range(0.01..500.0)
            };
            transactions.push((sender, recipient, amount));
        }
    }

    let frozen = (0..request.wallets)
        .filter(|_| rng.gen_bool(FROZEN_RATIO))
        .collect();

    Ok(SeedPlan {
        addresses,
        transactions,
        frozen,
    })
}

/// Generate and apply a random fixture
pub async fn seed(service: &WalletService, request: SeedRequest) -> Result<SeedSummary, ApiError> {
    request.validate()?;

    let plan = {
        let mut rng = StdRng::from_entropy();
        plan(&request, &mut rng)?
    };

    service.users().create_user(SEED_USERNAME).await?;
    for address in &plan.addresses {
        service.connect_wallet(SEED_USERNAME, address).await?;
    }

    for (sender, recipient, amount) in &plan.transactions {
        let request = RecordTransactionRequest {
            amount: *amount,
            recipient: plan.addresses[*recipient].as_str().to_string(),
            tx_hash: None,
        };
        service
            .record_transaction(&plan.addresses[*sender], request)
            .await?;
    }

    for index in &plan.frozen {
        service
            .admin_update(
                &plan.addresses[*index],
                AdminWalletUpdate {
                    frozen: Some(true),
                    ..Default::default()
                },
            )
            .await?;
    }

    let summary = SeedSummary {
        owner: SEED_USERNAME.to_string(),
        wallets_created: plan.addresses.len(),
        transactions_recorded: plan.transactions.len(),
        frozen: plan.frozen.len(),
    };
    info!(
        wallets = summary.wallets_created,
        transactions = summary.transactions_recorded,
        frozen = summary.frozen,
        "Seeded development fixture"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, WalletStore};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_random_address_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let address = random_address(&mut rng).unwrap();
        assert_eq!(address.as_str().len(), 42);
        assert!(address.as_str().starts_with("0x"));
    }

    #[test]
    fn test_plan_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = SeedRequest {
            wallets: 4,
            transactions_per_wallet: 3,
        };
        let plan = plan(&request, &mut rng).unwrap();
        assert_eq!(plan.addresses.len(), 4);
        assert_eq!(plan.transactions.len(), 12);
        assert!(plan.frozen.iter().all(|i| *i < 4));
    }

    #[tokio::test]
    async fn test_seed_runs_through_service() {
        let store = InMemoryStore::new();
        let service = WalletService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            None,
            Duration::from_millis(50),
        );

        let summary = seed(
            &service,
            SeedRequest {
                wallets: 3,
                transactions_per_wallet: 2,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.wallets_created, 3);
        assert_eq!(store.wallet_count().await, 3);
        let owned = store.list_by_owner(SEED_USERNAME).await.unwrap();
        let recorded: usize = owned.iter().map(|w| w.history.len()).sum();
        assert_eq!(recorded, 6);
    }

    #[tokio::test]
    async fn test_seed_rejects_zero_wallets() {
        let store = InMemoryStore::new();
        let service = WalletService::new(
            Arc::new(store.clone()),
            Arc::new(store),
            None,
            Duration::from_millis(50),
        );
        let result = seed(
            &service,
            SeedRequest {
                wallets: 0,
                transactions_per_wallet: 1,
            },
        )
        .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }
}
