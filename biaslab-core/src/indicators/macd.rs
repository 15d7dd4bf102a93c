//! Moving Average Convergence/Divergence (MACD).
//!
//! Line = EMA(close, fast) - EMA(close, slow)
//! Signal = EMA(line, signal)
//! Lookback: max(fast, slow, signal) - 1 for both outputs.
//!
//! The two outputs are exposed as separate named instances, like the banded
//! indicators, so the single-series `Indicator` trait stays unchanged.

use super::ema::{ewm, mask_warmup};
use super::{Indicator, Series};
use crate::domain::PriceBar;

/// Which MACD output an instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        let name = match output {
            MacdOutput::Line => format!("macd_line_{fast}_{slow}"),
            MacdOutput::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name,
        }
    }

    fn raw_line(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ewm(&closes, self.fast);
        let slow = ewm(&closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.fast.max(self.slow).max(self.signal).saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        let line = self.raw_line(bars);
        let values = match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => ewm(&line, self.signal),
        };
        mask_warmup(values, self.lookback())
    }
}
