//! GoPlus-compatible address security oracle

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{RiskSignalSource, SignalError};
use crate::models::WalletAddress;

/// Boolean flags reported by the oracle as "0" / "1" strings
const FLAG_FIELDS: &[&str] = &[
    "cybercrime",
    "money_laundering",
    "financial_crime",
    "darkweb_transactions",
    "phishing_activities",
    "fake_kyc",
    "blacklist_doubt",
    "stealing_attack",
    "blackmail_activities",
    "sanctioned",
    "malicious_mining_activities",
    "mixer",
    "honeypot_related_address",
];

const CODE_OK: i64 = 1;
const CODE_RATE_LIMITED: i64 = 4029;

#[derive(Debug, Deserialize)]
struct OracleResponse {
    code: i64,
    #[serde(default)]
    message: String,
    result: Option<HashMap<String, serde_json::Value>>,
}

/// Address security lookups against a GoPlus-style API
pub struct SecurityOracle {
    client: Client,
    base_url: String,
    chain_id: String,
}

impl SecurityOracle {
    pub fn new(base_url: String, chain_id: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            chain_id,
        }
    }
}

/// Turn an oracle answer into an optional flag reason
fn interpret(response: OracleResponse) -> Result<Option<String>, SignalError> {
    match response.code {
        CODE_OK => {}
        CODE_RATE_LIMITED => return Err(SignalError::RateLimited(response.message)),
        code => {
            return Err(SignalError::Unavailable(format!(
                "oracle returned code {}: {}",
                code, response.message
            )))
        }
    }

    let result = response
        .result
        .ok_or_else(|| SignalError::Malformed("missing result object".to_string()))?;

    let flagged: Vec<&str> = FLAG_FIELDS
        .iter()
        .copied()
        .filter(|field| {
            matches!(result.get(*field), Some(serde_json::Value::String(v)) if v == "1")
        })
        .collect();

    if flagged.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format!(
            "flagged by security oracle ({})",
            flagged.join(", ")
        )))
    }
}

#[async_trait]
impl RiskSignalSource for SecurityOracle {
    fn name(&self) -> &'static str {
        "security_oracle"
    }

    async fn check(&self, address: &WalletAddress) -> Result<Option<String>, SignalError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), address);

        let response = self
            .client
            .get(&url)
            .query(&[("chain_id", self.chain_id.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SignalError::RateLimited(format!(
                "HTTP {} from security oracle",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(SignalError::Unavailable(format!(
                "HTTP {} from security oracle",
                response.status()
            )));
        }

        let body: OracleResponse = response.json().await?;
        interpret(body)
    }
}
