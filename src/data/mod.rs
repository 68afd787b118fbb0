//! Currency and exchange-rate storage
//!
//! The analysis core reads currencies and rate histories through the
//! [`RateRepository`] trait. Two implementations ship with the crate:
//!
//! - **in_memory**: hash-map backed store, loadable from CSV
//! - **sqlite**: SQLite-backed store (feature `rusqlite-support`)
//!
//! # Example
//!
//! ```rust
//! use fx_trend::currency::Currency;
//! use fx_trend::data::{InMemoryRateRepository, RateRepository, SearchKind};
//! use chrono::NaiveDate;
//!
//! let mut repo = InMemoryRateRepository::new();
//! repo.add_currency(Currency::new(1, "USD", "US Dollar")).unwrap();
//! let day = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
//! repo.add_rate(1, day, 4100.0).unwrap();
//!
//! let found = repo.search_currencies(SearchKind::Symbol, "usd").unwrap();
//! assert_eq!(found[0].id, 1);
//! ```

pub mod in_memory;
#[cfg(feature = "rusqlite-support")]
pub mod sqlite;

pub use in_memory::InMemoryRateRepository;
#[cfg(feature = "rusqlite-support")]
pub use sqlite::SqliteRateRepository;

use crate::currency::{Currency, RateObservation};
use crate::error::{Result, TrendError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of currency search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// Exact or partial symbol match (wire code 1)
    Symbol,
    /// Partial name match (wire code 2)
    Name,
}

impl SearchKind {
    /// Numeric code used by the persistence layer's search API
    pub fn code(&self) -> i32 {
        match self {
            SearchKind::Symbol => 1,
            SearchKind::Name => 2,
        }
    }

    /// Parse from numeric code
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(SearchKind::Symbol),
            2 => Ok(SearchKind::Name),
            _ => Err(TrendError::InvalidData(format!(
                "Unknown search kind: {}",
                code
            ))),
        }
    }

    /// Whether `currency` contains `text` for this kind, compared with [`fold_case`]
    pub fn matches(&self, currency: &Currency, text: &str) -> bool {
        let needle = fold_case(text);
        match self {
            SearchKind::Symbol => fold_case(&currency.symbol).contains(&needle),
            SearchKind::Name => fold_case(&currency.name).contains(&needle),
        }
    }
}

/// Case folding used by every search path (Unicode uppercase, so "dólar" matches "DÓLAR")
pub fn fold_case(text: &str) -> String {
    text.to_uppercase()
}

/// Ordering applied to search results: exact symbol matches first, then by id.
///
/// Callers that take the first result therefore resolve to the exact match
/// with the lowest id.
pub fn search_order(text: &str) -> impl Fn(&Currency, &Currency) -> Ordering {
    let needle = fold_case(text);
    move |a, b| {
        let exact_a = fold_case(&a.symbol) == needle;
        let exact_b = fold_case(&b.symbol) == needle;
        exact_b.cmp(&exact_a).then(a.id.cmp(&b.id))
    }
}

/// Read interface over currency and rate storage
pub trait RateRepository: Send + Sync {
    /// Search currencies by symbol or name, ordered per [`search_order`]
    fn search_currencies(&self, kind: SearchKind, text: &str) -> Result<Vec<Currency>>;

    /// Rate history for a currency within `[from, to]`, ascending by date
    fn rate_history(
        &self,
        currency_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateObservation>>;

    /// Every rate of a currency, ascending by date
    fn rates(&self, currency_id: i64) -> Result<Vec<RateObservation>>;

    /// Rate of a currency on one date
    fn rate_on(&self, currency_id: i64, date: NaiveDate) -> Result<Option<RateObservation>>;

    /// Look up a currency by id
    fn currency(&self, id: i64) -> Result<Option<Currency>>;

    /// All currencies, ascending by id
    fn currencies(&self) -> Result<Vec<Currency>>;

    /// Most recent observation for a currency
    fn latest_rate(&self, currency_id: i64) -> Result<Option<RateObservation>>;
}

impl<R: RateRepository + ?Sized> RateRepository for Box<R> {
    fn search_currencies(&self, kind: SearchKind, text: &str) -> Result<Vec<Currency>> {
        (**self).search_currencies(kind, text)
    }

    fn rate_history(
        &self,
        currency_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateObservation>> {
        (**self).rate_history(currency_id, from, to)
    }

    fn rates(&self, currency_id: i64) -> Result<Vec<RateObservation>> {
        (**self).rates(currency_id)
    }

    fn rate_on(&self, currency_id: i64, date: NaiveDate) -> Result<Option<RateObservation>> {
        (**self).rate_on(currency_id, date)
    }

    fn currency(&self, id: i64) -> Result<Option<Currency>> {
        (**self).currency(id)
    }

    fn currencies(&self) -> Result<Vec<Currency>> {
        (**self).currencies()
    }

    fn latest_rate(&self, currency_id: i64) -> Result<Option<RateObservation>> {
        (**self).latest_rate(currency_id)
    }
}
