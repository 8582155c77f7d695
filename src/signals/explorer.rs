//! Etherscan-compatible explorer client

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{ExplorerActivity, ExplorerSource, ExplorerTx, SignalError};
use crate::models::WalletAddress;

/// Page size requested from the explorer
pub const EXPLORER_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTx {
    hash: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(default)]
    is_error: String,
    #[serde(default)]
    input: String,
}

impl TryFrom<RawTx> for ExplorerTx {
    type Error = SignalError;

    fn try_from(raw: RawTx) -> Result<Self, Self::Error> {
        let value_wei = raw
            .value
            .parse::<u128>()
            .map_err(|_| SignalError::Malformed(format!("bad value '{}'", raw.value)))?;
        Ok(ExplorerTx {
            hash: raw.hash,
            from: raw.from.to_lowercase(),
            to: raw.to.to_lowercase(),
            value_wei,
            is_error: raw.is_error == "1",
            has_input: !raw.input.is_empty() && raw.input != "0x",
        })
    }
}

/// Recent-transaction lookups against an Etherscan-style `account/txlist` API
pub struct EtherscanExplorer {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EtherscanExplorer {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            api_key,
        }
    }
}

fn interpret(response: TxListResponse) -> Result<ExplorerActivity, SignalError> {
    if response.status != "1" {
        if response.message.starts_with("No transactions found") {
            return Ok(ExplorerActivity::NoTransactions);
        }
        let detail = match &response.result {
            serde_json::Value::String(s) => s.clone(),
            _ => response.message.clone(),
        };
        if detail.to_lowercase().contains("rate limit") {
            return Err(SignalError::RateLimited(detail));
        }
        return Err(SignalError::Unavailable(detail));
    }

    let raw: Vec<RawTx> = serde_json::from_value(response.result)
        .map_err(|e| SignalError::Malformed(e.to_string()))?;

    if raw.is_empty() {
        return Ok(ExplorerActivity::NoTransactions);
    }

    let txs = raw
        .into_iter()
        .map(ExplorerTx::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExplorerActivity::Transactions(txs))
}

#[async_trait]
impl ExplorerSource for EtherscanExplorer {
    fn name(&self) -> &'static str {
        "etherscan"
    }

    async fn recent_activity(
        &self,
        address: &WalletAddress,
    ) -> Result<ExplorerActivity, SignalError> {
        let page_size = EXPLORER_PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address.as_str()),
                ("page", "1"),
                ("offset", page_size.as_str()),
                ("sort", "desc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SignalError::Unavailable(format!(
                "HTTP {} from explorer",
                response.status()
            )));
        }

        let body: TxListResponse = response.json().await?;
        interpret(body)
    }
}
