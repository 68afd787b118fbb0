//! Currency records and exchange-rate observations

use crate::error::{Result, TrendError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency as stored by the repository layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub symbol: String,
    pub name: String,
}

impl Currency {
    /// Create new currency
    pub fn new(id: i64, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Display label used on trend segments, e.g. `"USD - US Dollar"`
    pub fn label(&self) -> String {
        format!("{} - {}", self.symbol, self.name)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One daily exchange-rate sample for a currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub currency_id: i64,
    pub date: NaiveDate,
    pub rate: f64,
}

impl RateObservation {
    /// Create new observation
    pub fn new(currency_id: i64, date: NaiveDate, rate: f64) -> Self {
        Self {
            currency_id,
            date,
            rate,
        }
    }

    /// Rates must be finite and strictly positive to take part in a percentage comparison
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(TrendError::InvalidData(format!(
                "Rate for currency {} on {} must be positive, got: {}",
                self.currency_id, self.date, self.rate
            )));
        }
        Ok(())
    }
}
