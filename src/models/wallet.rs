//! Wallet trust-tracking models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::ApiError;

/// Score every wallet starts with, and the value an appeal resets to
pub const DEFAULT_TRUST_SCORE: i32 = 500;

/// Highest trust score the engine will produce
pub const MAX_TRUST_SCORE: i32 = 1000;

/// Lowest trust score the engine will produce
pub const MIN_TRUST_SCORE: i32 = 0;

/// Amounts at or above this value are treated as invalid data
pub const IMPLAUSIBLE_AMOUNT: f64 = 1e18;

const MAX_ADDRESS_LEN: usize = 128;

/// A wallet address, always trimmed and lowercased.
///
/// The only way to build one is [`WalletAddress::parse`], so two inputs that
/// differ only by case always end up keyed to the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ApiError::ValidationError(
                "Wallet address must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_ADDRESS_LEN {
            return Err(ApiError::ValidationError(format!(
                "Wallet address must be at most {} characters",
                MAX_ADDRESS_LEN
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
        {
            return Err(ApiError::ValidationError(format!(
                "Wallet address contains invalid characters: {}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WalletAddress::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

/// Risk classification label
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Suspicious,
    Blocked,
    Unknown,
}

impl RiskLevel {
    /// Score-derived level before admin flags are taken into account
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 200 => RiskLevel::Blocked,
            s if s < 500 => RiskLevel::Suspicious,
            _ => RiskLevel::Safe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Suspicious => "suspicious",
            RiskLevel::Blocked => "blocked",
            RiskLevel::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "safe" => Some(RiskLevel::Safe),
            "suspicious" => Some(RiskLevel::Suspicious),
            "blocked" => Some(RiskLevel::Blocked),
            "unknown" => Some(RiskLevel::Unknown),
            _ => None,
        }
    }
}

/// Cached risk level together with where it came from.
///
/// A computed level remembers the score it was derived from, so a level that
/// no longer matches the current score is detectable instead of silent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RiskClassification {
    Computed { level: RiskLevel, from_score: i32 },
    AdminOverridden { level: RiskLevel },
}

impl RiskClassification {
    pub fn level(&self) -> RiskLevel {
        match self {
            RiskClassification::Computed { level, .. } => *level,
            RiskClassification::AdminOverridden { level } => *level,
        }
    }

    /// True when a computed level was derived from a score other than `current_score`
    pub fn is_stale(&self, current_score: i32) -> bool {
        match self {
            RiskClassification::Computed { from_score, .. } => *from_score != current_score,
            RiskClassification::AdminOverridden { .. } => false,
        }
    }
}

impl Default for RiskClassification {
    fn default() -> Self {
        RiskClassification::Computed {
            level: RiskLevel::Safe,
            from_score: DEFAULT_TRUST_SCORE,
        }
    }
}

/// Transaction amount as it was stored.
///
/// History entries are externally supplied facts, and older entries may hold
/// the amount as a string. Anything that does not resolve to a plausible
/// number is excluded from aggregation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TxAmount {
    Number(f64),
    Text(String),
}

impl TxAmount {
    /// Numeric value if the amount is finite and below [`IMPLAUSIBLE_AMOUNT`]
    pub fn valid_value(&self) -> Option<f64> {
        let value = match self {
            TxAmount::Number(n) => *n,
            TxAmount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value < IMPLAUSIBLE_AMOUNT).then_some(value)
    }
}

/// One entry of a wallet's transaction history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TransactionEvent {
    #[serde(default)]
    pub amount: Option<TxAmount>,
    #[serde(default)]
    pub recipient: Option<String>,
    /// Delta that was applied to the trust score when this entry was recorded
    #[serde(default)]
    pub score_impact: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl TransactionEvent {
    /// Amount if this entry is usable for aggregation
    pub fn valid_amount(&self) -> Option<f64> {
        self.amount.as_ref().and_then(TxAmount::valid_value)
    }
}

/// Canonical trust state of one wallet
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WalletRecord {
    pub address: WalletAddress,
    pub trust_score: i32,
    pub risk: RiskClassification,
    pub frozen: bool,
    pub whitelist: bool,
    pub unblacklist_count: i32,
    pub history: Vec<TransactionEvent>,
    pub tags: Vec<String>,
    pub owner_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletRecord {
    /// Fresh record with default score and a clean slate
    pub fn new(address: WalletAddress, owner_username: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            address,
            trust_score: DEFAULT_TRUST_SCORE,
            risk: RiskClassification::default(),
            frozen: false,
            whitelist: false,
            unblacklist_count: 0,
            history: Vec::new(),
            tags: Vec::new(),
            owner_username,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk.level()
    }

    pub fn status(&self) -> WalletStatus {
        WalletStatus {
            trust_score: self.trust_score,
            risk_level: self.risk_level(),
            frozen: self.frozen,
            unblacklist_count: self.unblacklist_count,
        }
    }
}

/// Status block reported alongside analyses
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct WalletStatus {
    pub trust_score: i32,
    pub risk_level: RiskLevel,
    pub frozen: bool,
    pub unblacklist_count: i32,
}

/// Raw transaction facts supplied by a caller
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct RecordTransactionRequest {
    #[validate(range(min = 0.0, max = 1e18))]
    pub amount: f64,
    #[validate(length(min = 1, max = 128))]
    pub recipient: String,
    #[validate(length(max = 128))]
    pub tx_hash: Option<String>,
}

/// Admin override request; absent fields are left untouched
#[derive(Debug, Deserialize, Validate, Clone, Default)]
pub struct AdminWalletUpdate {
    #[validate(range(min = 0, max = 1000))]
    pub trust_score: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    pub frozen: Option<bool>,
    pub whitelist: Option<bool>,
}

impl AdminWalletUpdate {
    pub fn is_empty(&self) -> bool {
        self.trust_score.is_none()
            && self.risk_level.is_none()
            && self.frozen.is_none()
            && self.whitelist.is_none()
    }
}

/// Result of the multi-source scam determination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScamCheck {
    pub address: String,
    pub is_scam: bool,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_lowercased_and_trimmed() {
        let a = WalletAddress::parse("  0xABCdef01 ").unwrap();
        let b = WalletAddress::parse("0xabcdef01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef01");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(WalletAddress::parse("").is_err());
        assert!(WalletAddress::parse("   ").is_err());
        assert!(WalletAddress::parse("0xabc def").is_err());
        assert!(WalletAddress::parse(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_address_deserialize_normalizes() {
        let address: WalletAddress = serde_json::from_str("\"0xDEAD\"").unwrap();
        assert_eq!(address.as_str(), "0xdead");
        assert!(serde_json::from_str::<WalletAddress>("\"\"").is_err());
    }

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Blocked);
        assert_eq!(RiskLevel::from_score(199), RiskLevel::Blocked);
        assert_eq!(RiskLevel::from_score(200), RiskLevel::Suspicious);
        assert_eq!(RiskLevel::from_score(499), RiskLevel::Suspicious);
        assert_eq!(RiskLevel::from_score(500), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(1000), RiskLevel::Safe);
    }

    #[test]
    fn test_risk_level_round_trips_through_str() {
        for level in [
            RiskLevel::Safe,
            RiskLevel::Suspicious,
            RiskLevel::Blocked,
            RiskLevel::Unknown,
        ] {
            assert_eq!(RiskLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(RiskLevel::parse("An Toàn"), None);
    }

    #[test]
    fn test_classification_staleness() {
        let computed = RiskClassification::Computed {
            level: RiskLevel::Safe,
            from_score: 500,
        };
        assert!(!computed.is_stale(500));
        assert!(computed.is_stale(120));

        let overridden = RiskClassification::AdminOverridden {
            level: RiskLevel::Blocked,
        };
        assert!(!overridden.is_stale(900));
    }

    #[test]
    fn test_tx_amount_validity() {
        assert_eq!(TxAmount::Number(3.5).valid_value(), Some(3.5));
        assert_eq!(TxAmount::Text("42.25".to_string()).valid_value(), Some(42.25));
        assert_eq!(TxAmount::Number(1e19).valid_value(), None);
        assert_eq!(TxAmount::Number(1e18).valid_value(), None);
        assert_eq!(TxAmount::Text("lots".to_string()).valid_value(), None);
    }

    #[test]
    fn test_event_with_missing_fields_deserializes() {
        let event: TransactionEvent = serde_json::from_str("{}").unwrap();
        assert!(event.amount.is_none());
        assert_eq!(event.score_impact, 0);
        assert!(event.valid_amount().is_none());

        let event: TransactionEvent =
            serde_json::from_str(r#"{"amount": "12", "recipient": "0xbob", "score_impact": -5}"#)
                .unwrap();
        assert_eq!(event.valid_amount(), Some(12.0));
        assert_eq!(event.score_impact, -5);
    }

    #[test]
    fn test_admin_update_emptiness() {
        assert!(AdminWalletUpdate::default().is_empty());
        let update = AdminWalletUpdate {
            frozen: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
