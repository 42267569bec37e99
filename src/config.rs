//! Engine configuration.

use crate::core::currency::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings that shape how the engine values and records operations.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// use remittance_engine::config::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "convert_client_debt": true }"#).unwrap();
/// assert_eq!(config.pivot.as_str(), "USD");
/// assert!(config.convert_client_debt);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency every stored rate is anchored at.
    pub pivot: CurrencyCode,
    /// Convert client debt held in another currency to the pivot when
    /// valuing the business. Off by default: debt is then added to the
    /// pivot total as recorded.
    pub convert_client_debt: bool,
    /// Debt currency recorded on newly registered clients. Falls back to
    /// the pivot when unset.
    pub default_debt_currency: Option<CurrencyCode>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pivot: CurrencyCode::new("USD"),
            convert_client_debt: false,
            default_debt_currency: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn debt_currency(&self) -> &CurrencyCode {
        self.default_debt_currency.as_ref().unwrap_or(&self.pivot)
    }
}
