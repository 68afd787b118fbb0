//! # fx_trend
//!
//! Currency and exchange-rate records, with buy/sell trend segmentation
//! over daily rate histories.
//!
//! ## Example
//!
//! ```rust
//! use fx_trend::prelude::*;
//! use chrono::NaiveDate;
//!
//! let mut repo = InMemoryRateRepository::new();
//! repo.add_currency(Currency::new(1, "USD", "US Dollar")).unwrap();
//! for (d, rate) in [(1, 1.00), (2, 1.05), (3, 1.10), (4, 1.05)] {
//!     repo.add_rate(1, NaiveDate::from_ymd_opt(2025, 4, d).unwrap(), rate).unwrap();
//! }
//!
//! let service = CurrencyService::new(repo);
//! let segments = service
//!     .analyze_trend(
//!         "USD",
//!         NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
//!         1.0,
//!     )
//!     .unwrap();
//!
//! assert_eq!(segments[0].recommendation, Recommendation::Sell);
//! assert_eq!(segments[1].recommendation, Recommendation::Buy);
//! ```

pub mod analysis;
pub mod config;
pub mod currency;
pub mod data;
pub mod error;
pub mod service;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::analysis::{Recommendation, TrendConfig, TrendSegment, TrendSegmenter};
    pub use crate::currency::{Currency, RateObservation};
    pub use crate::data::{InMemoryRateRepository, RateRepository, SearchKind};
    pub use crate::error::{Result, TrendError};
    pub use crate::service::CurrencyService;
}
