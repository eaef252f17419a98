use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

pub const DEFAULT_API_BASE: &str = "https://mempool.space";

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of a mempool.space-compatible API.
    pub api_base: String,
    /// Fiat currency code looked up in the price feed.
    pub currency: String,
    pub timeout_secs: u64,
    /// Extra attempts after a failed request.
    pub retries: u32,
    pub high_fee_rate: f64,
    pub low_fee_rate: f64,
    pub scale_x_axis: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            currency: "USD".to_string(),
            timeout_secs: 30,
            retries: 2,
            high_fee_rate: 500.0,
            low_fee_rate: 1.0,
            scale_x_axis: false,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/utxo-spice/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("utxo-spice").join("config.toml"))
    }

    /// Loads an explicit config file, or the default one if it exists.
    ///
    /// A missing explicit file is an error; a missing default file just
    /// yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "loading config");
        let contents = fs::read_to_string(&path).map_err(|e| CliError::ConfigError {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&contents).map_err(|reason| CliError::ConfigError { path, reason })
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.api_base.trim().is_empty() {
            return Err("api_base must not be empty".to_string());
        }
        if self.currency.trim().is_empty() {
            return Err("currency must not be empty".to_string());
        }
        for (name, rate) in [
            ("high_fee_rate", self.high_fee_rate),
            ("low_fee_rate", self.low_fee_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_some_keys() {
        let config = Config::from_toml(
            r#"
            api_base = "http://localhost:8999"
            currency = "EUR"
            retries = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base, "http://localhost:8999");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.retries, 0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.high_fee_rate, 500.0);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(Config::from_toml("colour = \"red\"").is_err());
        assert!(Config::from_toml("high_fee_rate = -3.0").is_err());
        assert!(Config::from_toml("currency = \"\"").is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scale_x_axis = true\nlow_fee_rate = 2.0").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.scale_x_axis);
        assert_eq!(config.low_fee_rate, 2.0);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigError { .. }));
    }
}
