//! Relative Strength Index (RSI).
//!
//! Gains and losses come from successive close differences. The first bar has
//! no predecessor and counts as zero gain and zero loss.
//! avg_gain / avg_loss are simple rolling means over `period` values.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period - 1.
//! Edge case: avg_loss == 0 → no value (never infinity).

use super::sma::rolling_mean;
use super::{Indicator, Series};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        let n = bars.len();
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change > 0.0 {
                gains[i] = change;
            } else if change < 0.0 {
                losses[i] = -change;
            }
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(g, l)| match (g, l) {
                (Some(g), Some(l)) => compute_rsi(g, l),
                _ => None,
            })
            .collect()
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return None;
    }
    let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    Some(rsi.clamp(0.0, 100.0))
}
