//! In-memory rate repository
//!
//! Stores currencies by id and rates as `currency_id -> (date -> rate)`.
//! BTreeMap keeps each history sorted, so range queries come back in date order.

use super::{search_order, RateRepository, SearchKind};
use crate::currency::{Currency, RateObservation};
use crate::error::{Result, TrendError};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// CSV row for currency files: `id,symbol,name`
#[derive(Debug, Deserialize)]
struct CurrencyRecord {
    id: i64,
    symbol: String,
    name: String,
}

/// CSV row for rate files: `currency_id,date,rate`
#[derive(Debug, Deserialize)]
struct RateRecord {
    currency_id: i64,
    date: NaiveDate,
    rate: f64,
}

/// In-memory currency and rate storage
///
/// # Example
/// ```
/// use fx_trend::currency::Currency;
/// use fx_trend::data::{InMemoryRateRepository, RateRepository};
/// use chrono::NaiveDate;
///
/// let mut repo = InMemoryRateRepository::new();
/// repo.add_currency(Currency::new(1, "EUR", "Euro")).unwrap();
///
/// let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// repo.add_rate(1, d2, 1.22).unwrap();
/// repo.add_rate(1, d1, 1.20).unwrap();
///
/// let history = repo.rate_history(1, d1, d2).unwrap();
/// assert_eq!(history[0].rate, 1.20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateRepository {
    currencies: HashMap<i64, Currency>,
    rates: HashMap<i64, BTreeMap<NaiveDate, f64>>,
}

impl InMemoryRateRepository {
    /// Create empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a currency; ids must be unique
    pub fn add_currency(&mut self, currency: Currency) -> Result<()> {
        if self.currencies.contains_key(&currency.id) {
            return Err(TrendError::InvalidData(format!(
                "Duplicate currency id: {}",
                currency.id
            )));
        }
        self.currencies.insert(currency.id, currency);
        Ok(())
    }

    /// Add or replace the rate of a currency on a date
    pub fn add_rate(&mut self, currency_id: i64, date: NaiveDate, rate: f64) -> Result<()> {
        let observation = RateObservation::new(currency_id, date, rate);
        observation.validate()?;

        if !self.currencies.contains_key(&currency_id) {
            return Err(TrendError::NotFound(format!(
                "Currency with id {}",
                currency_id
            )));
        }

        self.rates.entry(currency_id).or_default().insert(date, rate);
        Ok(())
    }

    /// Add many observations; stops at the first invalid one
    pub fn add_rates(&mut self, observations: impl IntoIterator<Item = RateObservation>) -> Result<()> {
        for obs in observations {
            self.add_rate(obs.currency_id, obs.date, obs.rate)?;
        }
        Ok(())
    }

    /// Load currencies from CSV with header `id,symbol,name`
    pub fn load_currencies_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;

        for record in csv_reader.deserialize() {
            let record: CurrencyRecord = record?;
            self.add_currency(Currency::new(record.id, record.symbol, record.name))?;
            count += 1;
        }

        log::debug!("Loaded {} currencies from CSV", count);
        Ok(count)
    }

    /// Load rates from CSV with header `currency_id,date,rate` (dates as `YYYY-MM-DD`)
    pub fn load_rates_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;

        for (line, record) in csv_reader.deserialize().enumerate() {
            let record: RateRecord = record?;
            self.add_rate(record.currency_id, record.date, record.rate)
                .map_err(|e| match e {
                    TrendError::InvalidData(msg) => {
                        TrendError::InvalidData(format!("Row {}: {}", line + 1, msg))
                    }
                    other => other,
                })?;
            count += 1;
        }

        log::debug!("Loaded {} rates from CSV", count);
        Ok(count)
    }

    /// Number of stored currencies
    pub fn num_currencies(&self) -> usize {
        self.currencies.len()
    }

    /// Total number of rate entries across all currencies
    pub fn num_rates(&self) -> usize {
        self.rates.values().map(|tree| tree.len()).sum()
    }

    /// Every stored observation, grouped by currency id then date
    pub fn observations(&self) -> Vec<RateObservation> {
        let mut ids: Vec<i64> = self.rates.keys().copied().collect();
        ids.sort_unstable();

        ids.into_iter()
            .flat_map(|id| {
                self.rates[&id]
                    .iter()
                    .map(move |(date, rate)| RateObservation::new(id, *date, *rate))
            })
            .collect()
    }
}

impl RateRepository for InMemoryRateRepository {
    fn search_currencies(&self, kind: SearchKind, text: &str) -> Result<Vec<Currency>> {
        let mut found: Vec<Currency> = self
            .currencies
            .values()
            .filter(|c| kind.matches(c, text))
            .cloned()
            .collect();
        found.sort_by(search_order(text));
        Ok(found)
    }

    fn rate_history(
        &self,
        currency_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateObservation>> {
        if from > to {
            return Ok(Vec::new());
        }

        Ok(self
            .rates
            .get(&currency_id)
            .map(|tree| {
                tree.range(from..=to)
                    .map(|(date, rate)| RateObservation::new(currency_id, *date, *rate))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn rates(&self, currency_id: i64) -> Result<Vec<RateObservation>> {
        Ok(self
            .rates
            .get(&currency_id)
            .map(|tree| {
                tree.iter()
                    .map(|(date, rate)| RateObservation::new(currency_id, *date, *rate))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn rate_on(&self, currency_id: i64, date: NaiveDate) -> Result<Option<RateObservation>> {
        Ok(self
            .rates
            .get(&currency_id)
            .and_then(|tree| tree.get(&date))
            .map(|rate| RateObservation::new(currency_id, date, *rate)))
    }

    fn currency(&self, id: i64) -> Result<Option<Currency>> {
        Ok(self.currencies.get(&id).cloned())
    }

    fn currencies(&self) -> Result<Vec<Currency>> {
        let mut all: Vec<Currency> = self.currencies.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    fn latest_rate(&self, currency_id: i64) -> Result<Option<RateObservation>> {
        Ok(self
            .rates
            .get(&currency_id)
            .and_then(|tree| tree.iter().next_back())
            .map(|(date, rate)| RateObservation::new(currency_id, *date, *rate)))
    }
}
