//! Risk Report Generator
//!
//! Turns a wallet's current state and aggregated history into a tiered
//! verdict plus a readable narrative. Thresholds are fixed and evaluated
//! in precedence order, so the same record always yields the same report.

use serde::{Deserialize, Serialize};

use crate::models::{WalletAddress, WalletRecord, WalletStatus};
use crate::services::aggregator::{aggregate, HistoryAggregate, HistoryStats};

// ============================================================================
// Tier Thresholds
// ============================================================================

/// Below this score a wallet is always Very High risk
const VERY_HIGH_SCORE_CEILING: i32 = 100;

/// Below this score a wallet is at least High risk
const HIGH_SCORE_CEILING: i32 = 300;

/// Below this score a wallet is at least Medium risk
const MEDIUM_SCORE_CEILING: i32 = 500;

/// More appeals than this puts a wallet in the Very High tier
const REPEAT_APPEAL_LIMIT: i32 = 1;

const UNKNOWN_MESSAGE: &str =
    "This wallet has not been scored yet. No transaction history is available.";
const NO_TRANSACTIONS_MESSAGE: &str = "No transactions recorded yet for this wallet.";
const NO_VALID_DATA_MESSAGE: &str =
    "Transaction history exists but contains no valid transaction data.";
const UNAVAILABLE_MESSAGE: &str =
    "Wallet data is temporarily unavailable. Please try the analysis again later.";

// ============================================================================
// Data Models
// ============================================================================

/// Four-tier risk verdict
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskTier {
    /// First matching rule wins.
    ///
    /// A low score on a wallet that has already been appealed escalates
    /// straight to Very High.
    pub fn assess(trust_score: i32, unblacklist_count: i32) -> Self {
        let appealed = unblacklist_count > 0;
        if unblacklist_count > REPEAT_APPEAL_LIMIT
            || trust_score < VERY_HIGH_SCORE_CEILING
            || (appealed && trust_score < HIGH_SCORE_CEILING)
        {
            RiskTier::VeryHigh
        } else if trust_score < HIGH_SCORE_CEILING || appealed {
            RiskTier::High
        } else if trust_score < MEDIUM_SCORE_CEILING {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::VeryHigh => "Very High",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskTier::Low => "Wallet behaves normally. Standard monitoring is sufficient.",
            RiskTier::Medium => {
                "Some risk indicators present. Review large transfers before interacting."
            }
            RiskTier::High => {
                "Significant risk. Verify the counterparty before sending any funds."
            }
            RiskTier::VeryHigh => {
                "Severe risk. Avoid interacting with this wallet and consider reporting it."
            }
        }
    }
}

/// Outcome of an analysis, distinguishable for every degraded case
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// No record exists for the address
    Unknown,
    NoTransactions,
    /// History exists but nothing in it survived validation
    NoValidData,
    /// The store could not be read
    Unavailable,
    Assessed {
        tier: RiskTier,
        recommendation: String,
    },
}

/// Analysis result returned to callers
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisReport {
    pub address: String,
    pub status: Option<WalletStatus>,
    pub verdict: Verdict,
    pub stats: Option<HistoryStats>,
    pub narrative: String,
}

// ============================================================================
// Report Generation
// ============================================================================

/// Build the report for `address` from its record, if one exists
pub fn generate_report(address: &WalletAddress, record: Option<&WalletRecord>) -> AnalysisReport {
    let Some(record) = record else {
        return AnalysisReport {
            address: address.to_string(),
            status: None,
            verdict: Verdict::Unknown,
            stats: None,
            narrative: UNKNOWN_MESSAGE.to_string(),
        };
    };

    let status = record.status();

    if record.history.is_empty() {
        return AnalysisReport {
            address: address.to_string(),
            status: Some(status),
            verdict: Verdict::NoTransactions,
            stats: None,
            narrative: format!("{} {}", NO_TRANSACTIONS_MESSAGE, status_line(&status)),
        };
    }

    let stats = match aggregate(&record.history) {
        HistoryAggregate::InsufficientData => {
            return AnalysisReport {
                address: address.to_string(),
                status: Some(status),
                verdict: Verdict::NoValidData,
                stats: None,
                narrative: format!("{} {}", NO_VALID_DATA_MESSAGE, status_line(&status)),
            };
        }
        HistoryAggregate::Summary(stats) => stats,
    };

    let tier = RiskTier::assess(record.trust_score, record.unblacklist_count);

    AnalysisReport {
        address: address.to_string(),
        status: Some(status),
        verdict: Verdict::Assessed {
            tier,
            recommendation: tier.recommendation().to_string(),
        },
        narrative: narrative(&status, &stats, tier),
        stats: Some(stats),
    }
}

/// Report for input that is not a usable wallet address; nothing can be known about it
pub fn unrecognized_report(raw: &str) -> AnalysisReport {
    AnalysisReport {
        address: raw.trim().to_lowercase(),
        status: None,
        verdict: Verdict::Unknown,
        stats: None,
        narrative: UNKNOWN_MESSAGE.to_string(),
    }
}

/// Report used when the store could not be consulted
pub fn unavailable_report(address: &WalletAddress) -> AnalysisReport {
    AnalysisReport {
        address: address.to_string(),
        status: None,
        verdict: Verdict::Unavailable,
        stats: None,
        narrative: UNAVAILABLE_MESSAGE.to_string(),
    }
}

fn status_line(status: &WalletStatus) -> String {
    format!(
        "Current trust score is {} ({}).",
        status.trust_score,
        status.risk_level.as_str()
    )
}

fn narrative(status: &WalletStatus, stats: &HistoryStats, tier: RiskTier) -> String {
    let mut parts = vec![
        format!(
            "Analyzed {} transaction(s) totalling {:.4}, averaging {:.4}, with a maximum of {:.4}.",
            stats.count, stats.total_amount, stats.average_amount, stats.max_amount
        ),
        format!(
            "Funds went to {} distinct recipient(s).",
            stats.distinct_recipients
        ),
    ];

    if let Some(worst) = stats.worst_impact {
        parts.push(format!(
            "{} transaction(s) lowered the trust score, the worst by {} points.",
            stats.negative_impact_count,
            worst.unsigned_abs()
        ));
    }

    if stats.outlier_count > 0 {
        parts.push(format!(
            "{} transaction(s) were far above the wallet's average amount.",
            stats.outlier_count
        ));
    }

    if status.unblacklist_count > 0 {
        parts.push(format!(
            "The wallet has been appealed {} time(s).",
            status.unblacklist_count
        ));
    }

    if status.frozen {
        parts.push("The wallet is currently frozen by an administrator.".to_string());
    }

    parts.push(status_line(status));
    parts.push(format!(
        "Risk tier: {}. {}",
        tier.label(),
        tier.recommendation()
    ));

    parts.join(" ")
}
