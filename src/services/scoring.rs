//! Trust Scoring & Classification Engine for Detectus
//!
//! Decides how a wallet's trust score and risk classification move when a
//! transaction is recorded, an appeal is granted or an admin overrides state.
//! Everything here is pure: the engine reads a snapshot and produces a
//! [`WalletPatch`] that the store applies atomically.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{
    AdminWalletUpdate, RiskClassification, RiskLevel, TransactionEvent, TxAmount, WalletAddress,
    WalletRecord, DEFAULT_TRUST_SCORE, IMPLAUSIBLE_AMOUNT, MAX_TRUST_SCORE, MIN_TRUST_SCORE,
};
use crate::services::aggregator::{aggregate, HistoryAggregate, OUTLIER_FACTOR};
use crate::store::WalletPatch;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Reward for every completed transaction
const BASE_REWARD: i32 = 5;

/// Amounts at or above this are treated as large transfers
const LARGE_TRANSFER_THRESHOLD: f64 = 10_000.0;

const LARGE_TRANSFER_PENALTY: i32 = -25;

/// Penalty for an amount far above the wallet's own average
const OUTLIER_PENALTY: i32 = -40;

/// Prior valid entries needed before outlier detection applies
const MIN_HISTORY_FOR_OUTLIER: usize = 3;

/// Counterparties scored below this are treated as flagged
const FLAGGED_COUNTERPARTY_SCORE: i32 = 200;

const FLAGGED_COUNTERPARTY_PENALTY: i32 = -150;

const SUSPICIOUS_COUNTERPARTY_PENALTY: i32 = -50;

const SELF_TRANSFER_PENALTY: i32 = -10;

// ============================================================================
// Data Models
// ============================================================================

/// Raw facts about a transaction, as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFacts {
    pub amount: f64,
    pub recipient: WalletAddress,
    pub tx_hash: Option<String>,
}

/// Why a score moved
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    CompletedTransaction,
    LargeTransfer,
    AmountOutlier,
    FlaggedCounterparty,
    SuspiciousCounterparty,
    SelfTransfer,
}

impl ScoreFactor {
    pub fn delta(&self) -> i32 {
        match self {
            ScoreFactor::CompletedTransaction => BASE_REWARD,
            ScoreFactor::LargeTransfer => LARGE_TRANSFER_PENALTY,
            ScoreFactor::AmountOutlier => OUTLIER_PENALTY,
            ScoreFactor::FlaggedCounterparty => FLAGGED_COUNTERPARTY_PENALTY,
            ScoreFactor::SuspiciousCounterparty => SUSPICIOUS_COUNTERPARTY_PENALTY,
            ScoreFactor::SelfTransfer => SELF_TRANSFER_PENALTY,
        }
    }
}

/// Result of scoring one transaction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoreDecision {
    pub previous_score: i32,
    pub new_score: i32,
    /// Delta actually applied, after clamping
    pub score_impact: i32,
    pub classification: RiskClassification,
    pub factors: Vec<ScoreFactor>,
}

// ============================================================================
// Scoring Engine
// ============================================================================

/// Stateless scoring and classification rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classification for `score`, with the admin flags applied.
    ///
    /// `frozen` always wins and forces `Blocked`; otherwise `whitelist` forces `Safe`.
    pub fn classify(&self, score: i32, frozen: bool, whitelist: bool) -> RiskClassification {
        let level = if frozen {
            RiskLevel::Blocked
        } else if whitelist {
            RiskLevel::Safe
        } else {
            RiskLevel::from_score(score)
        };
        RiskClassification::Computed {
            level,
            from_score: score,
        }
    }

    /// Score one transaction against the wallet's current state
    pub fn score_transaction(
        &self,
        record: &WalletRecord,
        facts: &TransactionFacts,
        counterparty: Option<&WalletRecord>,
    ) -> ScoreDecision {
        let mut factors = vec![ScoreFactor::CompletedTransaction];

        if facts.amount >= LARGE_TRANSFER_THRESHOLD {
            factors.push(ScoreFactor::LargeTransfer);
        }

        if let HistoryAggregate::Summary(stats) = aggregate(&record.history) {
            if stats.count >= MIN_HISTORY_FOR_OUTLIER
                && facts.amount > stats.average_amount * OUTLIER_FACTOR
            {
                factors.push(ScoreFactor::AmountOutlier);
            }
        }

        if facts.recipient == record.address {
            factors.push(ScoreFactor::SelfTransfer);
        } else if let Some(other) = counterparty {
            if is_flagged(other) {
                factors.push(ScoreFactor::FlaggedCounterparty);
            } else if is_suspicious(other) {
                factors.push(ScoreFactor::SuspiciousCounterparty);
            }
        }

        let raw_delta: i32 = factors.iter().map(ScoreFactor::delta).sum();
        let new_score = (record.trust_score + raw_delta).clamp(MIN_TRUST_SCORE, MAX_TRUST_SCORE);

        ScoreDecision {
            previous_score: record.trust_score,
            new_score,
            score_impact: new_score - record.trust_score,
            classification: self.classify(new_score, record.frozen, record.whitelist),
            factors,
        }
    }

    /// Patch that records a transaction: history entry plus new score and level
    pub fn transaction_patch(
        &self,
        record: &WalletRecord,
        facts: &TransactionFacts,
        counterparty: Option<&WalletRecord>,
    ) -> Result<(WalletPatch, ScoreDecision), ApiError> {
        if !facts.amount.is_finite() || facts.amount < 0.0 || facts.amount >= IMPLAUSIBLE_AMOUNT {
            return Err(ApiError::ValidationError(format!(
                "Transaction amount must be between 0 and {:e}",
                IMPLAUSIBLE_AMOUNT
            )));
        }

        let decision = self.score_transaction(record, facts, counterparty);

        let event = TransactionEvent {
            amount: Some(TxAmount::Number(facts.amount)),
            recipient: Some(facts.recipient.as_str().to_string()),
            score_impact: decision.score_impact,
            tx_hash: facts.tx_hash.clone(),
            recorded_at: Some(Utc::now()),
        };

        let patch = WalletPatch {
            trust_score: Some(decision.new_score),
            risk: Some(decision.classification),
            append_event: Some(event),
            ..Default::default()
        };

        Ok((patch, decision))
    }

    /// Patch for a granted appeal: unconditional reset plus one more appeal on record
    pub fn appeal_patch(&self) -> WalletPatch {
        WalletPatch {
            trust_score: Some(DEFAULT_TRUST_SCORE),
            risk: Some(RiskClassification::Computed {
                level: RiskLevel::Safe,
                from_score: DEFAULT_TRUST_SCORE,
            }),
            increment_unblacklist: true,
            ..Default::default()
        }
    }

    /// Patch for an admin override; only the supplied fields change
    pub fn admin_patch(&self, update: &AdminWalletUpdate) -> Result<WalletPatch, ApiError> {
        if update.is_empty() {
            return Err(ApiError::BadRequest(
                "At least one of trust_score, risk_level, frozen or whitelist is required"
                    .to_string(),
            ));
        }

        Ok(WalletPatch {
            trust_score: update.trust_score,
            risk: update
                .risk_level
                .map(|level| RiskClassification::AdminOverridden { level }),
            frozen: update.frozen,
            whitelist: update.whitelist,
            ..Default::default()
        })
    }
}

fn is_flagged(wallet: &WalletRecord) -> bool {
    wallet.frozen
        || wallet.risk_level() == RiskLevel::Blocked
        || (!wallet.whitelist && wallet.trust_score < FLAGGED_COUNTERPARTY_SCORE)
}

fn is_suspicious(wallet: &WalletRecord) -> bool {
    !wallet.whitelist
        && (wallet.risk_level() == RiskLevel::Suspicious || wallet.trust_score < DEFAULT_TRUST_SCORE)
}
