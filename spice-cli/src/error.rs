use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("HTTP error! status: {status} ({url})")]
    HttpStatus { status: u16, url: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Price source has no quote for currency {0}")]
    MissingCurrency(String),

    #[error("No UTXOs found for this address.")]
    NoUtxos,

    #[error("Configuration error in {path}: {reason}")]
    ConfigError { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
