//! PriceBar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar for a single ticker.
///
/// Sequences are ordered ascending by date and unique on (ticker, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reasons a bar is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} is negative ({value})")]
    Negative { field: &'static str, value: f64 },
    #[error("close must be positive for ratio computations")]
    NonPositiveClose,
}

impl PriceBar {
    /// Typical price: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Check the numeric contract every core computation relies on.
    pub fn validate(&self) -> Result<(), BarError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(BarError::Negative { field, value });
            }
        }
        if self.close <= 0.0 {
            return Err(BarError::NonPositiveClose);
        }
        Ok(())
    }
}

/// True when bars are strictly ascending by date.
pub fn is_sorted_by_date(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}
