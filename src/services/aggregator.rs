//! History aggregation
//!
//! Summarizes a wallet's stored transaction history. Entries whose amount is
//! missing, non-numeric or implausibly large are skipped entirely: they add
//! nothing to counts, sums or averages.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::TransactionEvent;

/// A valid amount above this multiple of the mean counts as an outlier
pub const OUTLIER_FACTOR: f64 = 10.0;

/// Summary statistics over the valid entries of a history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryStats {
    pub count: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub max_amount: f64,
    pub distinct_recipients: usize,
    pub negative_impact_count: usize,
    /// Most negative score impact among negative-impact entries
    pub worst_impact: Option<i32>,
    pub outlier_count: usize,
}

/// Outcome of aggregating a history
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAggregate {
    /// No entry survived validation
    InsufficientData,
    Summary(HistoryStats),
}

impl HistoryAggregate {
    pub fn stats(&self) -> Option<&HistoryStats> {
        match self {
            HistoryAggregate::InsufficientData => None,
            HistoryAggregate::Summary(stats) => Some(stats),
        }
    }
}

/// Aggregate the valid entries of `history`
pub fn aggregate(history: &[TransactionEvent]) -> HistoryAggregate {
    let valid: Vec<(f64, &TransactionEvent)> = history
        .iter()
        .filter_map(|event| event.valid_amount().map(|amount| (amount, event)))
        .collect();

    if valid.is_empty() {
        return HistoryAggregate::InsufficientData;
    }

    let count = valid.len();
    let total_amount: f64 = valid.iter().map(|(amount, _)| amount).sum();
    let average_amount = total_amount / count as f64;
    let max_amount = valid
        .iter()
        .map(|(amount, _)| *amount)
        .fold(f64::MIN, f64::max);

    let distinct_recipients = valid
        .iter()
        .filter_map(|(_, event)| event.recipient.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let negative: Vec<i32> = valid
        .iter()
        .map(|(_, event)| event.score_impact)
        .filter(|impact| *impact < 0)
        .collect();

    let outlier_count = valid
        .iter()
        .filter(|(amount, _)| *amount > average_amount * OUTLIER_FACTOR)
        .count();

    HistoryAggregate::Summary(HistoryStats {
        count,
        total_amount,
        average_amount,
        max_amount,
        distinct_recipients,
        negative_impact_count: negative.len(),
        worst_impact: negative.iter().copied().min(),
        outlier_count,
    })
}
