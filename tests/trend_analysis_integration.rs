//! Integration tests for trend analysis through the currency service
//!
//! Covers:
//! 1. Buy/sell segmentation scenarios end to end
//! 2. Symbol resolution and its error cases
//! 3. Repository implementations behaving the same way

use chrono::{Datelike, Duration, NaiveDate};
use fx_trend::analysis::{Recommendation, TrendSegment};
use fx_trend::currency::{Currency, RateObservation};
use fx_trend::data::{InMemoryRateRepository, RateRepository, SearchKind};
use fx_trend::error::{Result, TrendError};
use fx_trend::service::CurrencyService;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, n).unwrap()
}

fn service_with_rates(rates: &[f64]) -> CurrencyService<InMemoryRateRepository> {
    let mut repo = InMemoryRateRepository::new();
    repo.add_currency(Currency::new(1, "USD", "Dolar estadounidense")).unwrap();
    repo.add_currency(Currency::new(2, "EUR", "Euro")).unwrap();
    for (i, rate) in rates.iter().enumerate() {
        repo.add_rate(1, day(i as u32 + 1), *rate).unwrap();
    }
    CurrencyService::new(repo)
}

fn analyze(rates: &[f64]) -> Result<Vec<TrendSegment>> {
    service_with_rates(rates).analyze_trend("USD", day(1), day(30), 1.0)
}

fn assert_partition(segments: &[TrendSegment], first: NaiveDate, last: NaiveDate) {
    assert!(!segments.is_empty());
    assert_eq!(segments.first().unwrap().from_date, first);
    assert_eq!(segments.last().unwrap().to_date, last);
    for s in segments {
        assert!(s.from_date <= s.to_date);
    }
    for pair in segments.windows(2) {
        assert_eq!(pair[0].to_date, pair[1].from_date);
        assert_ne!(pair[0].recommendation, pair[1].recommendation);
    }
}

#[test]
fn test_every_step_above_threshold() {
    let segments = analyze(&[1.00, 1.05, 1.10, 1.05]).unwrap();
    assert!(!segments.is_empty());
    assert!(segments
        .iter()
        .all(|s| matches!(s.recommendation, Recommendation::Sell | Recommendation::Buy)));
    assert_eq!(segments[0].recommendation, Recommendation::Sell);
    assert_eq!(segments.last().unwrap().recommendation, Recommendation::Buy);
    assert_partition(&segments, day(1), day(4));
}

#[test]
fn test_no_step_reaches_threshold() {
    let segments = analyze(&[1.00, 1.003, 1.005]).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].recommendation, Recommendation::NoChange);
    assert_eq!(segments[0].from_date, day(1));
    assert_eq!(segments[0].to_date, day(3));
}

#[test]
fn test_unknown_symbol_is_not_found() {
    let service = service_with_rates(&[1.0, 1.1]);
    let err = service.analyze_trend("XXX", day(1), day(30), 1.0).unwrap_err();
    assert!(matches!(err, TrendError::NotFound(_)));
}

#[test]
fn test_rise_fall_rise_cycle() {
    let segments = analyze(&[1.00, 1.05, 1.10, 1.05, 1.00, 0.95, 1.00, 1.05]).unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1].from_date, day(3));
    assert_eq!(segments[1].to_date, day(6));
    assert_eq!(segments[1].recommendation, Recommendation::Buy);
    assert_partition(&segments, day(1), day(8));
}

#[test]
fn test_short_histories_are_insufficient() {
    for rates in [&[][..], &[4100.0][..]] {
        let err = analyze(rates).unwrap_err();
        assert!(matches!(err, TrendError::InsufficientData { .. }));
        assert!(err.is_client_error());
    }
}

#[test]
fn test_date_window_limits_history() {
    let service = service_with_rates(&[1.00, 1.05, 1.10, 1.05, 1.00, 0.95, 1.00, 1.05]);
    let segments = service.analyze_trend("USD", day(4), day(6), 1.0).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].recommendation, Recommendation::Buy);
    assert_eq!((segments[0].from_date, segments[0].to_date), (day(4), day(6)));
}

#[test]
fn test_higher_threshold_merges_segments() {
    let rates = [100.0, 101.5, 103.0, 101.5, 100.0];
    let service = service_with_rates(&rates);

    let fine = service.analyze_trend("USD", day(1), day(30), 1.0).unwrap();
    assert_eq!(fine.len(), 2);

    let coarse = service.analyze_trend("USD", day(1), day(30), 2.0).unwrap();
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].recommendation, Recommendation::NoChange);
}

/// Repository that hands back whatever it was built with, unchecked
struct FixedRepository {
    currencies: Vec<Currency>,
    history: Vec<RateObservation>,
}

impl RateRepository for FixedRepository {
    fn search_currencies(&self, _kind: SearchKind, _text: &str) -> Result<Vec<Currency>> {
        Ok(self.currencies.clone())
    }

    fn rate_history(&self, _id: i64, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<RateObservation>> {
        Ok(self.history.clone())
    }

    fn rates(&self, _id: i64) -> Result<Vec<RateObservation>> {
        Ok(self.history.clone())
    }

    fn rate_on(&self, _id: i64, date: NaiveDate) -> Result<Option<RateObservation>> {
        Ok(self.history.iter().find(|o| o.date == date).copied())
    }

    fn currency(&self, id: i64) -> Result<Option<Currency>> {
        Ok(self.currencies.iter().find(|c| c.id == id).cloned())
    }

    fn currencies(&self) -> Result<Vec<Currency>> {
        Ok(self.currencies.clone())
    }

    fn latest_rate(&self, _id: i64) -> Result<Option<RateObservation>> {
        Ok(self.history.last().copied())
    }
}

#[test]
fn test_zero_rate_from_storage_is_invalid_data() {
    let repo = FixedRepository {
        currencies: vec![Currency::new(1, "USD", "US Dollar")],
        history: vec![
            RateObservation::new(1, day(1), 0.0),
            RateObservation::new(1, day(2), 1.0),
        ],
    };
    let err = CurrencyService::new(repo)
        .analyze_trend("USD", day(1), day(2), 1.0)
        .unwrap_err();
    assert!(matches!(err, TrendError::InvalidData(_)));
}

#[test]
fn test_unsorted_storage_history_is_sorted() {
    let repo = FixedRepository {
        currencies: vec![Currency::new(1, "USD", "US Dollar")],
        history: vec![
            RateObservation::new(1, day(3), 1.10),
            RateObservation::new(1, day(1), 1.00),
            RateObservation::new(1, day(2), 1.05),
        ],
    };
    let service = CurrencyService::new(repo);
    let segments = service.analyze_trend("USD", day(1), day(3), 1.0).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].recommendation, Recommendation::Sell);
    assert_eq!((segments[0].from_date, segments[0].to_date), (day(1), day(3)));

    let history = service.rate_history(1, day(1), day(3)).unwrap();
    assert!(history.windows(2).all(|p| p[0].date < p[1].date));
}

#[test]
fn test_first_match_wins() {
    let repo = FixedRepository {
        currencies: vec![
            Currency::new(4, "USD", "US Dollar"),
            Currency::new(9, "USD", "US Dollar (duplicate)"),
        ],
        history: vec![
            RateObservation::new(4, day(1), 1.0),
            RateObservation::new(4, day(2), 1.0),
        ],
    };
    let segments = CurrencyService::new(repo)
        .analyze_trend("USD", day(1), day(2), 1.0)
        .unwrap();
    assert_eq!(segments[0].currency, "USD - US Dollar");
}

#[test]
fn test_exact_symbol_preferred_over_partial() {
    let mut repo = InMemoryRateRepository::new();
    repo.add_currency(Currency::new(1, "USDT", "Tether")).unwrap();
    repo.add_currency(Currency::new(2, "USD", "US Dollar")).unwrap();
    repo.add_rate(2, day(1), 1.0).unwrap();
    repo.add_rate(2, day(2), 1.2).unwrap();

    let service = CurrencyService::new(repo);
    assert_eq!(service.resolve_symbol("usd").unwrap().id, 2);
    let segments = service.analyze_trend("usd", day(1), day(2), 1.0).unwrap();
    assert_eq!(segments[0].currency, "USD - US Dollar");
}

#[cfg(feature = "rusqlite-support")]
#[test]
fn test_sqlite_and_memory_agree() {
    use fx_trend::data::SqliteRateRepository;

    let rates = [1.00, 1.05, 1.10, 1.05, 1.00, 0.95, 1.00, 1.05];
    let memory = service_with_rates(&rates);

    let sqlite = SqliteRateRepository::open_in_memory().unwrap();
    sqlite.import_from(memory.repository()).unwrap();
    let sqlite = CurrencyService::new(sqlite);

    let a = memory.analyze_trend("USD", day(1), day(30), 1.0).unwrap();
    let b = sqlite.analyze_trend("USD", day(1), day(30), 1.0).unwrap();
    assert_eq!(a, b);
    assert!(sqlite.analyze_trend("XXX", day(1), day(30), 1.0).unwrap_err().is_not_found());
}

#[cfg(feature = "rusqlite-support")]
#[test]
fn test_wildcard_symbols_not_found_on_both_stores() {
    use fx_trend::data::SqliteRateRepository;

    let memory = service_with_rates(&[1.00, 1.05, 1.10]);
    let sqlite = SqliteRateRepository::open_in_memory().unwrap();
    sqlite.import_from(memory.repository()).unwrap();
    let sqlite = CurrencyService::new(sqlite);

    for symbol in ["%", "U_D"] {
        let from_memory = memory.analyze_trend(symbol, day(1), day(30), 1.0);
        let from_sqlite = sqlite.analyze_trend(symbol, day(1), day(30), 1.0);
        assert!(from_memory.unwrap_err().is_not_found(), "memory resolved {}", symbol);
        assert!(from_sqlite.unwrap_err().is_not_found(), "sqlite resolved {}", symbol);
    }
}

#[test]
fn test_long_history_from_csv() {
    let mut csv = String::from("currency_id,date,rate\n");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..366 {
        let date = start + Duration::days(i);
        // Weekly sawtooth: three 2% rises then a flat stretch
        let rate = 4000.0 * (1.0 + 0.02 * ((i % 7).min(3) as f64));
        csv.push_str(&format!("1,{},{}\n", date, rate));
    }

    let mut repo = InMemoryRateRepository::new();
    repo.load_currencies_csv("id,symbol,name\n1,COP,Peso colombiano\n".as_bytes())
        .unwrap();
    assert_eq!(repo.load_rates_csv(csv.as_bytes()).unwrap(), 366);

    let end = start + Duration::days(365);
    let segments = CurrencyService::new(repo)
        .analyze_trend("COP", start, end, 1.0)
        .unwrap();
    assert_partition(&segments, start, end);
    assert_eq!(segments[0].from_date.year(), 2024);
}
