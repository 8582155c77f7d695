//! User account models
//!
//! Credentials are owned by the external credential service; this side only
//! keeps the username and the wallets connected to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

/// User account as seen by the trust-tracking core
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct UserAccount {
    pub username: String,
    pub is_verified: bool,
    /// Connected wallet addresses, in connection order
    pub wallets: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(username: String) -> Self {
        Self {
            username,
            is_verified: false,
            wallets: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Usernames are email addresses and compared case-insensitively
pub fn normalize_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::ValidationError(
            "Username must not be empty".to_string(),
        ));
    }
    Ok(username)
}

/// Request body for connecting a wallet to a user
#[derive(Debug, Deserialize, Validate)]
pub struct ConnectWalletRequest {
    #[validate(length(min = 1, max = 128))]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(
            normalize_username(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(normalize_username("  ").is_err());
    }
}
