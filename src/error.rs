//! Error types for fx_trend

use thiserror::Error;

/// Main error type for fx_trend
#[derive(Error, Debug)]
pub enum TrendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient data: at least 2 observations required, got {observations}")]
    InsufficientData { observations: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl TrendError {
    /// True for errors a caller should surface as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrendError::NotFound(_))
    }

    /// True for errors caused by the request or its data rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TrendError::InsufficientData { .. } | TrendError::InvalidData(_)
        )
    }
}

/// Result type alias for fx_trend operations
pub type Result<T> = std::result::Result<T, TrendError>;
