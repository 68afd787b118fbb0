//! Currency service - lookups, rate history and trend analysis
//!
//! Thin layer over a [`RateRepository`]: read operations pass straight
//! through, while [`CurrencyService::analyze_trend`] resolves a symbol,
//! fetches the history and hands it to the [`TrendSegmenter`].

use crate::analysis::{TrendConfig, TrendSegment, TrendSegmenter};
use crate::currency::{Currency, RateObservation};
use crate::data::{RateRepository, SearchKind};
use crate::error::{Result, TrendError};
use chrono::NaiveDate;

pub struct CurrencyService<R: RateRepository> {
    repository: R,
    config: TrendConfig,
}

impl<R: RateRepository> CurrencyService<R> {
    /// Create service with the default 1% threshold
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            config: TrendConfig::default(),
        }
    }

    /// Create service with a configured default threshold
    pub fn with_config(repository: R, config: TrendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { repository, config })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Get currency by id
    pub fn currency(&self, id: i64) -> Result<Currency> {
        self.repository
            .currency(id)?
            .ok_or_else(|| TrendError::NotFound(format!("Currency with id {}", id)))
    }

    /// All currencies
    pub fn currencies(&self) -> Result<Vec<Currency>> {
        self.repository.currencies()
    }

    /// Search currencies by symbol or name
    pub fn search(&self, kind: SearchKind, text: &str) -> Result<Vec<Currency>> {
        self.repository.search_currencies(kind, text)
    }

    /// Rate history within `[from, to]`, ascending by date
    pub fn rate_history(
        &self,
        currency_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateObservation>> {
        let mut history = self.repository.rate_history(currency_id, from, to)?;
        history.sort_by_key(|o| o.date);
        Ok(history)
    }

    /// Every recorded rate of a currency, ascending by date
    pub fn rates(&self, currency_id: i64) -> Result<Vec<RateObservation>> {
        let mut rates = self.repository.rates(currency_id)?;
        rates.sort_by_key(|o| o.date);
        Ok(rates)
    }

    /// Rate of a currency on one date
    pub fn rate_on(&self, currency_id: i64, date: NaiveDate) -> Result<RateObservation> {
        self.repository.rate_on(currency_id, date)?.ok_or_else(|| {
            TrendError::NotFound(format!("No rate for currency {} on {}", currency_id, date))
        })
    }

    /// Most recent rate of a currency
    pub fn current_rate(&self, currency_id: i64) -> Result<RateObservation> {
        self.repository.latest_rate(currency_id)?.ok_or_else(|| {
            TrendError::NotFound(format!("No rates recorded for currency {}", currency_id))
        })
    }

    /// Resolve a symbol to one currency; the first search result wins
    pub fn resolve_symbol(&self, symbol: &str) -> Result<Currency> {
        let mut found = self.repository.search_currencies(SearchKind::Symbol, symbol)?;
        if found.len() > 1 {
            log::warn!(
                "Symbol '{}' matched {} currencies, using {}",
                symbol,
                found.len(),
                found[0]
            );
        }
        if found.is_empty() {
            return Err(TrendError::NotFound(format!(
                "Currency with symbol '{}'",
                symbol
            )));
        }
        Ok(found.swap_remove(0))
    }

    /// Segment the rate history of `symbol` within `[from, to]` into trend ranges
    pub fn analyze_trend(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        threshold_pct: f64,
    ) -> Result<Vec<TrendSegment>> {
        let segmenter = TrendSegmenter::new(TrendConfig::new(threshold_pct)?)?;

        let currency = self.resolve_symbol(symbol)?;
        log::info!(
            "Analyzing {} from {} to {} (threshold {}%)",
            currency,
            from,
            to,
            threshold_pct
        );

        let history = self.repository.rate_history(currency.id, from, to)?;
        let segments = segmenter.segment(&currency, &history)?;

        log::info!("{} produced {} trend segments", currency.symbol, segments.len());
        Ok(segments)
    }

    /// [`analyze_trend`](Self::analyze_trend) with the configured threshold
    pub fn analyze_trend_default(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TrendSegment>> {
        self.analyze_trend(symbol, from, to, self.config.threshold_pct)
    }
}
