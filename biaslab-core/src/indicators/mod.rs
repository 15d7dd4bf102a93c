//! Indicator Engine and the concrete indicators it is built from.
//!
//! Every indicator implements the `Indicator` trait: a full bar series in, a
//! series of the same length out. Series are computed column by column once
//! per ticker and then zipped into `IndicatorRow`s by the engine.
//!
//! Multi-output indicators (MACD) are exposed as separate named instances per
//! output, keeping the single-series trait unchanged.

pub mod atr;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod volume;
pub mod vwap;

pub use atr::Atr;
pub use ema::Ema;
pub use engine::{IndicatorConfig, IndicatorEngine};
pub use macd::{Macd, MacdOutput};
pub use roc::{Roc, Volatility};
pub use rsi::Rsi;
pub use volume::VolumeSurge;
pub use vwap::{Vwap, VwapPolicy};

use crate::domain::PriceBar;

/// One value per bar; `None` where the indicator is not computable.
pub type Series = Vec<Option<f64>>;

/// Trait for indicators.
///
/// The first `lookback()` values are `None` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that never carry a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Series;
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                ticker: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
