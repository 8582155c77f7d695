//! Business logic services for Detectus

pub mod aggregator;
pub mod enrichment;
pub mod report;
pub mod risk_check;
pub mod scoring;
pub mod seed;
mod wallet;

pub use risk_check::RiskCheckService;
pub use scoring::ScoringEngine;
pub use wallet::{ConnectOutcome, EnrichmentOutcome, TransactionOutcome, WalletService};
