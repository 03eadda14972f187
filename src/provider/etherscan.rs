//! Etherscan-compatible HTTP provider
//!
//! ## API Reference
//!
//! Every call is a `GET <api_url>?module=...&action=...` returning
//! `{"status": "1"|"0", "message": "...", "result": ...}`.
//!
//! | Operation              | module  | action            |
//! |------------------------|---------|-------------------|
//! | standard transfers     | account | txlist            |
//! | internal transfers     | account | txlistinternal    |
//! | mined blocks           | account | getminedblocks    |
//! | ERC-20 transfers       | account | tokentx           |
//! | ERC-721 transfers      | account | tokennfttx        |
//! | balance                | account | balance           |
//! | block by timestamp     | block   | getblocknobytime  |
//!
//! Status `"0"` is not always a failure: list endpoints use it with
//! "No transactions found" / "No records found" for an empty result.

use super::records::{RawMinedBlock, RawTokenTransfer, RawTransfer};
use super::{BlockRange, LedgerProvider};
use crate::error::{TracerError, TracerResult};
use crate::ledger::{Address, MinedBlockKind, TokenStandard, TransferKind};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/api";

/// Connection settings for the Etherscan API
#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl EtherscanConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ETHERSCAN_API_URL` (default: https://api.etherscan.io/api)
    /// - `ETHERSCAN_API_KEY` (optional; unauthenticated calls are heavily rate limited)
    /// - `REQUEST_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EtherscanConfig::from_env`], reading from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("ETHERSCAN_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = lookup("ETHERSCAN_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let request_timeout = Duration::from_secs(
            lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(10),
        );

        Self {
            api_url,
            api_key,
            request_timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl Envelope {
    fn parse(body: &str) -> TracerResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    fn is_empty_result(&self) -> bool {
        self.message.starts_with("No ")
    }

    fn failure(&self) -> TracerError {
        let detail = match &self.result {
            serde_json::Value::String(s) if !s.is_empty() => format!("{}: {}", self.message, s),
            _ => self.message.clone(),
        };
        TracerError::DataSource(detail)
    }

    fn result_text(&self) -> TracerResult<String> {
        match &self.result {
            serde_json::Value::String(s) => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(TracerError::DataSource(format!(
                "expected scalar result, got {}",
                other
            ))),
        }
    }
}

/// Decode a list response; "no records" becomes an empty list
pub fn decode_list<T: DeserializeOwned>(body: &str) -> TracerResult<Vec<T>> {
    let envelope = Envelope::parse(body)?;
    if !envelope.is_ok() {
        if envelope.is_empty_result() {
            return Ok(Vec::new());
        }
        return Err(envelope.failure());
    }
    Ok(serde_json::from_value(envelope.result)?)
}

/// Decode a `getblocknobytime` response
pub fn decode_block(body: &str, timestamp: i64) -> TracerResult<u64> {
    let envelope = Envelope::parse(body)?;
    if !envelope.is_ok() {
        log::debug!("Block lookup for {} failed: {:?}", timestamp, envelope.result);
        return Err(TracerError::BlockNotFound { timestamp });
    }
    envelope
        .result_text()?
        .trim()
        .parse::<u64>()
        .map_err(|_| TracerError::BlockNotFound { timestamp })
}

/// Decode a `balance` response into its raw wei string
pub fn decode_balance(body: &str, address: &Address) -> TracerResult<String> {
    let envelope = Envelope::parse(body)?;
    if !envelope.is_ok() {
        log::debug!("Balance lookup for {} failed: {:?}", address, envelope.result);
        return Err(TracerError::AccountNotFound(address.to_string()));
    }
    envelope.result_text()
}

pub struct EtherscanProvider {
    client: reqwest::Client,
    config: EtherscanConfig,
}

impl EtherscanProvider {
    pub fn new(config: EtherscanConfig) -> TracerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> TracerResult<Self> {
        Self::new(EtherscanConfig::from_env())
    }

    async fn request(&self, mut params: Vec<(&'static str, String)>) -> TracerResult<String> {
        log::debug!("GET {} {:?}", self.config.api_url, params);
        if let Some(key) = &self.config.api_key {
            params.push(("apikey", key.clone()));
        }

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TracerError::DataSource(format!(
                "Etherscan API error: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    fn range_params(params: &mut Vec<(&'static str, String)>, range: BlockRange) {
        params.push(("startblock", range.from.to_string()));
        if let Some(to) = range.to {
            params.push(("endblock", to.to_string()));
        }
        params.push(("sort", "desc".to_string()));
    }

    async fn block_by_time(&self, timestamp: i64, closest: &str) -> TracerResult<u64> {
        let body = self
            .request(vec![
                ("module", "block".to_string()),
                ("action", "getblocknobytime".to_string()),
                ("timestamp", timestamp.to_string()),
                ("closest", closest.to_string()),
            ])
            .await?;
        decode_block(&body, timestamp)
    }
}

#[async_trait]
impl LedgerProvider for EtherscanProvider {
    async fn fetch_transfers(
        &self,
        address: &Address,
        range: BlockRange,
        kind: TransferKind,
    ) -> TracerResult<Vec<RawTransfer>> {
        let action = match kind {
            TransferKind::Standard => "txlist",
            TransferKind::Internal => "txlistinternal",
        };
        let mut params = vec![
            ("module", "account".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
        ];
        Self::range_params(&mut params, range);
        decode_list(&self.request(params).await?)
    }

    async fn fetch_mined_blocks(
        &self,
        address: &Address,
        kind: MinedBlockKind,
    ) -> TracerResult<Vec<RawMinedBlock>> {
        let block_type = match kind {
            MinedBlockKind::Regular => "blocks",
            MinedBlockKind::Uncle => "uncles",
        };
        let params = vec![
            ("module", "account".to_string()),
            ("action", "getminedblocks".to_string()),
            ("address", address.to_string()),
            ("blocktype", block_type.to_string()),
        ];
        decode_list(&self.request(params).await?)
    }

    async fn fetch_token_transfers(
        &self,
        address: &Address,
        standard: TokenStandard,
        range: BlockRange,
    ) -> TracerResult<Vec<RawTokenTransfer>> {
        let action = match standard {
            TokenStandard::Fungible => "tokentx",
            TokenStandard::NonFungible => "tokennfttx",
        };
        let mut params = vec![
            ("module", "account".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
        ];
        Self::range_params(&mut params, range);
        decode_list(&self.request(params).await?)
    }

    async fn fetch_block_at_or_before(&self, timestamp: i64) -> TracerResult<u64> {
        self.block_by_time(timestamp, "before").await
    }

    async fn fetch_block_at_or_after(&self, timestamp: i64) -> TracerResult<u64> {
        self.block_by_time(timestamp, "after").await
    }

    async fn fetch_balance(&self, address: &Address) -> TracerResult<String> {
        let params = vec![
            ("module", "account".to_string()),
            ("action", "balance".to_string()),
            ("address", address.to_string()),
            ("tag", "latest".to_string()),
        ];
        decode_balance(&self.request(params).await?, address)
    }

    fn provider_name(&self) -> &'static str {
        "etherscan"
    }
}
