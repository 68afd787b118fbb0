//! Investment-trend segmentation
//!
//! Splits a daily rate history into contiguous date ranges, each labeled
//! with a recommendation derived from day-over-day percentage variation.
//!
//! A move of at least `threshold_pct` percent sets the label: a rising rate
//! means [`Recommendation::Sell`], a falling one [`Recommendation::Buy`].
//! Smaller moves keep whatever label is already active, so a trend persists
//! through noise until another threshold-crossing move overrides it. Until
//! the first such move the label is [`Recommendation::NoChange`].
//!
//! Adjacent segments share their boundary date: a segment closes on the
//! observation where the next one opens.

use crate::currency::{Currency, RateObservation};
use crate::error::{Result, TrendError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default variation threshold, in percent
pub const DEFAULT_THRESHOLD_PCT: f64 = 1.0;

/// Recommendation attached to a trend segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Sell,
    Buy,
    #[serde(rename = "No-change")]
    NoChange,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Sell => "Sell",
            Recommendation::Buy => "Buy",
            Recommendation::NoChange => "No-change",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A date range sharing one recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSegment {
    /// Currency display label, e.g. `"USD - US Dollar"`
    pub currency: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub recommendation: Recommendation,
}

/// Segmentation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Minimum day-over-day variation, in percent, that sets a directional label
    pub threshold_pct: f64,
}

impl TrendConfig {
    pub fn new(threshold_pct: f64) -> Result<Self> {
        let config = Self { threshold_pct };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold_pct.is_finite() || self.threshold_pct < 0.0 {
            return Err(TrendError::InvalidData(format!(
                "Threshold must be a finite non-negative percentage, got: {}",
                self.threshold_pct
            )));
        }
        Ok(())
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

/// Absolute percentage change from `previous` to `current`
pub fn variation_pct(previous: &RateObservation, current: &RateObservation) -> Result<f64> {
    if !previous.rate.is_finite() || previous.rate <= 0.0 {
        return Err(TrendError::InvalidData(format!(
            "Cannot compute variation from non-positive rate {} on {}",
            previous.rate, previous.date
        )));
    }
    Ok((current.rate - previous.rate).abs() / previous.rate * 100.0)
}

/// Segment still being extended by the scan
#[derive(Debug, Clone, Copy)]
struct OpenSegment {
    recommendation: Recommendation,
    start: NaiveDate,
}

/// Trend segmenter over a materialized rate history
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSegmenter {
    config: TrendConfig,
}

impl TrendSegmenter {
    /// Create segmenter; fails on a negative or non-finite threshold
    pub fn new(config: TrendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Label implied by one day-over-day step, given the label currently open
    fn candidate(
        &self,
        previous: &RateObservation,
        current: &RateObservation,
        open: Option<Recommendation>,
    ) -> Result<Recommendation> {
        let variation = variation_pct(previous, current)?;

        // A flat step never triggers, even with a zero threshold
        if variation > 0.0 && variation >= self.config.threshold_pct {
            if current.rate > previous.rate {
                Ok(Recommendation::Sell)
            } else {
                Ok(Recommendation::Buy)
            }
        } else {
            Ok(open.unwrap_or(Recommendation::NoChange))
        }
    }

    /// Segment a rate history for `currency`
    ///
    /// Observations are sorted by date first. Requires at least two
    /// observations, all for `currency`, with distinct dates and positive
    /// finite rates.
    pub fn segment(
        &self,
        currency: &Currency,
        observations: &[RateObservation],
    ) -> Result<Vec<TrendSegment>> {
        if observations.len() < 2 {
            return Err(TrendError::InsufficientData {
                observations: observations.len(),
            });
        }

        let mut sorted = observations.to_vec();
        sorted.sort_by_key(|o| o.date);
        validate_history(currency, &sorted)?;

        let label = currency.label();
        let make_segment = |open: OpenSegment, to_date: NaiveDate| TrendSegment {
            currency: label.clone(),
            from_date: open.start,
            to_date,
            recommendation: open.recommendation,
        };

        let mut segments = Vec::new();
        let mut open: Option<OpenSegment> = None;

        for pair in sorted.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            let candidate = self.candidate(previous, current, open.map(|o| o.recommendation))?;

            if open.map(|o| o.recommendation) != Some(candidate) {
                // The first label opens a segment without closing one
                if let Some(seg) = open {
                    segments.push(make_segment(seg, previous.date));
                }
                open = Some(OpenSegment {
                    recommendation: candidate,
                    start: previous.date,
                });
            }
        }

        // At least one pair was scanned, so a segment is always open here
        if let (Some(seg), Some(last)) = (open, sorted.last()) {
            segments.push(make_segment(seg, last.date));
        }

        log::debug!(
            "Segmented {} observations for {} into {} segments (threshold {}%)",
            sorted.len(),
            currency.symbol,
            segments.len(),
            self.config.threshold_pct
        );
        Ok(segments)
    }
}

/// Rejects histories mixing currencies, repeating dates or carrying unusable rates.
/// Expects `history` sorted by date.
fn validate_history(currency: &Currency, history: &[RateObservation]) -> Result<()> {
    for obs in history {
        if obs.currency_id != currency.id {
            return Err(TrendError::InvalidData(format!(
                "Observation on {} belongs to currency {}, expected {}",
                obs.date, obs.currency_id, currency.id
            )));
        }
        obs.validate()?;
    }

    if let Some(pair) = history.windows(2).find(|p| p[0].date == p[1].date) {
        return Err(TrendError::InvalidData(format!(
            "Duplicate observation date {} for {}",
            pair[0].date, currency.symbol
        )));
    }

    Ok(())
}
