//! Configuration file handling
//!
//! ```toml
//! threshold = 1.5
//!
//! [data]
//! database = "/var/lib/fx-trend/rates.db"
//! # or, without a database:
//! currencies_csv = "currencies.csv"
//! rates_csv = "rates.csv"
//! ```

use crate::analysis::{TrendConfig, DEFAULT_THRESHOLD_PCT};
use crate::error::{Result, TrendError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default variation threshold, in percent
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub data: DataConfig,
}

/// Where currencies and rates are read from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies_csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates_csv: Option<PathBuf>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_PCT
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            data: DataConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| TrendError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.trend()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TrendError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Segmenter settings derived from this config
    pub fn trend(&self) -> Result<TrendConfig> {
        TrendConfig::new(self.threshold)
            .map_err(|e| TrendError::ConfigError(e.to_string()))
    }
}
