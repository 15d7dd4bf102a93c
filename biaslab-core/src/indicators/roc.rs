//! Bar-to-bar price ratios.
//!
//! Rate of change: (close[t] - close[t-period]) / close[t-period] * 100.
//! With period 1 this is the price-action percentage. Lookback: period.
//!
//! Intraday volatility: (high - low) / close * 100. Lookback: 0.

use super::{Indicator, Series};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        (0..bars.len())
            .map(|i| {
                let prev = bars[i.checked_sub(self.period)?].close;
                (prev != 0.0).then(|| (bars[i].close - prev) / prev * 100.0)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Volatility;

impl Indicator for Volatility {
    fn name(&self) -> &str {
        "volatility"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        bars.iter()
            .map(|b| (b.close != 0.0).then(|| (b.high - b.low) / b.close * 100.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn roc_basic() {
        // Closes: 100, 110, 121 → +10% each bar
        let bars = make_bars(&[100.0, 110.0, 121.0]);
        let result = Roc::new(1).compute(&bars);
        assert!(result[0].is_none());
        assert_approx(result[1].unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 10.0, 1e-9);
    }

    #[test]
    fn roc_longer_period() {
        let bars = make_bars(&[100.0, 105.0, 120.0]);
        let result = Roc::new(2).compute(&bars);
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn volatility_is_range_over_close() {
        // make_bars: high = max(open, close) + 1, low = min(open, close) - 1
        let bars = make_bars(&[100.0]);
        let result = Volatility.compute(&bars);
        assert_approx(result[0].unwrap(), 2.0, DEFAULT_EPSILON);
    }
}
