//! Advisory tag derivation from explorer activity

use crate::signals::{ExplorerActivity, EXPLORER_PAGE_SIZE};

pub const TAG_NO_DATA: &str = "no-data";
pub const TAG_HIGH_ACTIVITY: &str = "high-activity";
pub const TAG_CONTRACT_INTERACTION: &str = "contract-interaction";
pub const TAG_FAILED_TRANSACTIONS: &str = "failed-transactions";
pub const TAG_WHALE_TRANSFER: &str = "whale-transfer";

/// 100 ETH in wei
const WHALE_TRANSFER_WEI: u128 = 100 * 1_000_000_000_000_000_000;

/// Tags suggested by what the explorer reports
pub fn derive_tags(activity: &ExplorerActivity) -> Vec<String> {
    let txs = match activity {
        ExplorerActivity::NoTransactions => return vec![TAG_NO_DATA.to_string()],
        ExplorerActivity::Transactions(txs) => txs,
    };

    let mut tags = Vec::new();
    if txs.len() >= EXPLORER_PAGE_SIZE {
        tags.push(TAG_HIGH_ACTIVITY);
    }
    if txs.iter().any(|tx| tx.has_input) {
        tags.push(TAG_CONTRACT_INTERACTION);
    }
    if txs.iter().any(|tx| tx.is_error) {
        tags.push(TAG_FAILED_TRANSACTIONS);
    }
    if txs.iter().any(|tx| tx.value_wei >= WHALE_TRANSFER_WEI) {
        tags.push(TAG_WHALE_TRANSFER);
    }
    tags.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::ExplorerTx;

    fn tx(value_wei: u128, is_error: bool, has_input: bool) -> ExplorerTx {
        ExplorerTx {
            hash: "0x1".to_string(),
            from: "0xa".to_string(),
            to: "0xb".to_string(),
            value_wei,
            is_error,
            has_input,
        }
    }

    #[test]
    fn test_no_transactions_gets_no_data_tag() {
        assert_eq!(
            derive_tags(&ExplorerActivity::NoTransactions),
            vec![TAG_NO_DATA]
        );
    }

    #[test]
    fn test_quiet_wallet_gets_no_tags() {
        let activity = ExplorerActivity::Transactions(vec![tx(1_000, false, false)]);
        assert!(derive_tags(&activity).is_empty());
    }

    #[test]
    fn test_all_tags() {
        let mut txs: Vec<ExplorerTx> = (0..EXPLORER_PAGE_SIZE)
            .map(|_| tx(0, false, false))
            .collect();
        txs.push(tx(WHALE_TRANSFER_WEI, false, false));
        txs.push(tx(0, true, true));

        let tags = derive_tags(&ExplorerActivity::Transactions(txs));
        assert_eq!(
            tags,
            vec![
                TAG_HIGH_ACTIVITY,
                TAG_CONTRACT_INTERACTION,
                TAG_FAILED_TRANSACTIONS,
                TAG_WHALE_TRANSFER
            ]
        );
    }
}
