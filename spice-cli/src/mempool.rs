use std::{collections::HashMap, thread, time::Duration};

use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::error::CliError;

const RETRY_BASE_DELAY_MS: u64 = 250;

/// Where address, fee and price data come from.
pub trait ChainSource {
    fn utxos(&self, address: &str) -> Result<Vec<Utxo>, CliError>;

    fn recommended_fees(&self) -> Result<RecommendedFees, CliError>;

    /// Price of one BTC in `currency`.
    fn price(&self, currency: &str) -> Result<f64, CliError>;

    fn address_txs(&self, address: &str) -> Result<Vec<Transaction>, CliError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Satoshis.
    pub value: u64,
    #[serde(default)]
    pub status: UtxoStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UtxoStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u64>,
}

/// Fee recommendations in sat/vB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendedFees {
    pub fastest_fee: f64,
    pub half_hour_fee: f64,
    pub hour_fee: f64,
    pub economy_fee: f64,
    pub minimum_fee: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<TxIn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxIn {
    /// Absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<Prevout>,
    #[serde(default)]
    pub scriptsig_asm: Option<String>,
    #[serde(default)]
    pub inner_witnessscript_asm: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Prevout {
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    #[serde(default)]
    pub value: u64,
}

/// Picks `currency` out of a `/api/v1/prices` response.
pub fn select_price(
    prices: &HashMap<String, serde_json::Value>,
    currency: &str,
) -> Result<f64, CliError> {
    prices
        .get(currency)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| CliError::MissingCurrency(currency.to_string()))
}

/// Blocking client for a mempool.space-compatible REST API.
pub struct MempoolClient {
    http: Client,
    api_base: String,
    retries: u32,
}

impl MempoolClient {
    pub fn new(api_base: &str, timeout: Duration, retries: u32) -> Result<Self, CliError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("utxo-spice/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            retries,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let url = format!("{}{}", self.api_base, path);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");

            match self.fetch(&url) {
                Ok(body) => return Ok(body),
                Err(err) if attempt <= self.retries && is_retryable(&err) => {
                    warn!(%url, attempt, error = %err, "request failed, retrying");
                    thread::sleep(retry_delay(attempt));
                }
                Err(err) => {
                    warn!(%url, attempt, error = %err, "request failed");
                    return Err(err);
                }
            }
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, CliError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json()?)
    }
}

impl ChainSource for MempoolClient {
    fn utxos(&self, address: &str) -> Result<Vec<Utxo>, CliError> {
        self.get_json(&format!("/api/address/{address}/utxo"))
    }

    fn recommended_fees(&self) -> Result<RecommendedFees, CliError> {
        self.get_json("/api/v1/fees/recommended")
    }

    fn price(&self, currency: &str) -> Result<f64, CliError> {
        let prices: HashMap<String, serde_json::Value> = self.get_json("/api/v1/prices")?;
        select_price(&prices, currency)
    }

    fn address_txs(&self, address: &str) -> Result<Vec<Transaction>, CliError> {
        self.get_json(&format!("/api/address/{address}/txs"))
    }
}

/// Server faults, throttling and transport failures are worth another try.
/// Client errors and undecodable bodies are not.
fn is_retryable(err: &CliError) -> bool {
    match err {
        CliError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        CliError::Transport(e) => !e.is_decode() && !e.is_builder(),
        _ => false,
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_BASE_DELAY_MS << attempt.saturating_sub(1).min(4))
}
