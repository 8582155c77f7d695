//! Trust scoring, classification and analysis tests
//!
//! Exercise the scoring engine and report generator through the wallet
//! service, backed by the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use detectus_server::error::ApiError;
use detectus_server::models::{
    AdminWalletUpdate, RecordTransactionRequest, RiskClassification, RiskLevel, TransactionEvent,
    TxAmount, WalletAddress,
};
use detectus_server::services::aggregator::{aggregate, HistoryAggregate};
use detectus_server::services::report::{RiskTier, Verdict};
use detectus_server::services::WalletService;
use detectus_server::store::{InMemoryStore, UserStore, WalletStore};

fn service() -> (WalletService, InMemoryStore) {
    let store = InMemoryStore::new();
    let service = WalletService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        None,
        Duration::from_millis(50),
    );
    (service, store)
}

fn addr(s: &str) -> WalletAddress {
    WalletAddress::parse(s).unwrap()
}

fn tx(amount: f64, recipient: &str) -> RecordTransactionRequest {
    RecordTransactionRequest {
        amount,
        recipient: recipient.to_string(),
        tx_hash: None,
    }
}

// ============================================================================
// Tier Boundary Tests
// ============================================================================

#[test]
fn test_tier_boundaries() {
    assert_eq!(RiskTier::assess(99, 0), RiskTier::VeryHigh);
    assert_eq!(RiskTier::assess(100, 0), RiskTier::High);
    assert_eq!(RiskTier::assess(299, 1), RiskTier::VeryHigh);
    assert_eq!(RiskTier::assess(300, 0), RiskTier::Medium);
    assert_eq!(RiskTier::assess(499, 0), RiskTier::Medium);
    assert_eq!(RiskTier::assess(500, 0), RiskTier::Low);
}

#[test]
fn test_tier_recommendations_are_fixed() {
    for tier in [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::VeryHigh,
    ] {
        assert!(!tier.recommendation().is_empty());
        assert_eq!(tier.recommendation(), tier.recommendation());
    }
}

// ============================================================================
// Aggregation Tests
// ============================================================================

#[test]
fn test_implausible_amount_excluded_from_aggregation() {
    let history = vec![
        TransactionEvent {
            amount: Some(TxAmount::Number(1e19)),
            recipient: Some("0xa".to_string()),
            ..Default::default()
        },
        TransactionEvent {
            amount: Some(TxAmount::Number(3.5)),
            recipient: Some("0xb".to_string()),
            ..Default::default()
        },
    ];

    let HistoryAggregate::Summary(stats) = aggregate(&history) else {
        panic!("expected a summary");
    };
    assert_eq!(stats.count, 1);
    assert_eq!(stats.total_amount, 3.5);
}

// ============================================================================
// State Transition Tests
// ============================================================================

#[tokio::test]
async fn test_case_insensitive_addresses_share_a_record() {
    let (service, store) = service();
    service.ensure_wallet(&addr("0xABCdef")).await.unwrap();

    let upper = store.find(&addr("0xABCDEF")).await.unwrap().unwrap();
    let lower = store.find(&addr("0xabcdef")).await.unwrap().unwrap();
    assert_eq!(upper, lower);
    assert_eq!(store.wallet_count().await, 1);
}

#[tokio::test]
async fn test_appeal_monotonicity() {
    let (service, _) = service();
    let wallet = addr("0xappeal");
    service.ensure_wallet(&wallet).await.unwrap();

    for round in 1..=3 {
        service
            .admin_update(
                &wallet,
                AdminWalletUpdate {
                    trust_score: Some(round * 20),
                    risk_level: Some(RiskLevel::Blocked),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let appealed = service.appeal(&wallet).await.unwrap();
        assert_eq!(appealed.trust_score, 500);
        assert_eq!(appealed.risk_level(), RiskLevel::Safe);
        assert_eq!(appealed.unblacklist_count, round);
    }
}

#[tokio::test]
async fn test_appeal_never_creates_a_record() {
    let (service, store) = service();
    let result = service.appeal(&addr("0xghost")).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert_eq!(store.wallet_count().await, 0);
}

#[tokio::test]
async fn test_admin_partial_patch() {
    let (service, _) = service();
    let wallet = addr("0xpartial");
    service.ensure_wallet(&wallet).await.unwrap();
    service
        .record_transaction(&wallet, tx(1.0, "0xother"))
        .await
        .unwrap();
    let before = service.get_wallet(&wallet).await.unwrap();

    let after = service
        .admin_update(
            &wallet,
            AdminWalletUpdate {
                frozen: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(after.frozen);
    assert_eq!(after.trust_score, before.trust_score);
    assert_eq!(after.risk, before.risk);
}

#[tokio::test]
async fn test_admin_override_is_tagged() {
    let (service, _) = service();
    let wallet = addr("0xoverride");
    service.ensure_wallet(&wallet).await.unwrap();

    let updated = service
        .admin_update(
            &wallet,
            AdminWalletUpdate {
                risk_level: Some(RiskLevel::Suspicious),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        updated.risk,
        RiskClassification::AdminOverridden {
            level: RiskLevel::Suspicious
        }
    );

    let empty = service
        .admin_update(&wallet, AdminWalletUpdate::default())
        .await;
    assert!(matches!(empty, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn test_transactions_with_flagged_counterparty() {
    let (service, _) = service();
    let sender = addr("0xsender");
    let scammer = addr("0xscammer");
    service.ensure_wallet(&sender).await.unwrap();
    service.ensure_wallet(&scammer).await.unwrap();
    service
        .admin_update(
            &scammer,
            AdminWalletUpdate {
                frozen: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let first = service
        .record_transaction(&sender, tx(10.0, "0xSCAMMER"))
        .await
        .unwrap();
    assert_eq!(first.wallet.trust_score, 355);
    assert_eq!(first.wallet.risk_level(), RiskLevel::Suspicious);
    assert_eq!(first.wallet.history[0].score_impact, -145);

    let second = service
        .record_transaction(&sender, tx(10.0, "0xscammer"))
        .await
        .unwrap();
    assert_eq!(second.wallet.trust_score, 210);

    let third = service
        .record_transaction(&sender, tx(10.0, "0xscammer"))
        .await
        .unwrap();
    assert_eq!(third.wallet.trust_score, 65);
    assert_eq!(third.wallet.risk_level(), RiskLevel::Blocked);
}

#[tokio::test]
async fn test_whitelist_keeps_wallet_safe() {
    let (service, _) = service();
    let wallet = addr("0xexchange");
    service.ensure_wallet(&wallet).await.unwrap();
    service
        .admin_update(
            &wallet,
            AdminWalletUpdate {
                trust_score: Some(150),
                whitelist: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = service
        .record_transaction(&wallet, tx(1.0, "0xsomeone"))
        .await
        .unwrap();
    assert_eq!(outcome.wallet.trust_score, 155);
    assert_eq!(outcome.wallet.risk_level(), RiskLevel::Safe);
}

// ============================================================================
// Analysis Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_and_empty_history_verdicts_differ() {
    let (service, store) = service();
    store.create_user("alice").await.unwrap();
    service
        .connect_wallet("alice", &addr("0xfresh"))
        .await
        .unwrap();

    let unknown = service.analyze(&addr("0xnever")).await;
    let empty = service.analyze(&addr("0xfresh")).await;

    assert_eq!(unknown.verdict, Verdict::Unknown);
    assert_eq!(empty.verdict, Verdict::NoTransactions);
    assert_ne!(unknown.narrative, empty.narrative);
}

#[tokio::test]
async fn test_analysis_after_transactions() {
    let (service, _) = service();
    let wallet = addr("0xbusy");
    service.ensure_wallet(&wallet).await.unwrap();
    for amount in [1.0, 2.0, 3.0] {
        service
            .record_transaction(&wallet, tx(amount, "0xpeer"))
            .await
            .unwrap();
    }

    let report = service.analyze(&wallet).await;
    let Verdict::Assessed { tier, .. } = report.verdict else {
        panic!("expected an assessed verdict");
    };
    assert_eq!(tier, RiskTier::Low);
    let stats = report.stats.unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.distinct_recipients, 1);
    assert!(report.narrative.contains("totalling 6.0000"));
}
