//! Rate history analysis

pub mod trend;

pub use trend::{
    variation_pct, Recommendation, TrendConfig, TrendSegment, TrendSegmenter,
    DEFAULT_THRESHOLD_PCT,
};
