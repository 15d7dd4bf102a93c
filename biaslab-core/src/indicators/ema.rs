//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA[0] = close[0], no bias correction.
//! Lookback: span - 1. The recursion runs from the first bar; only the
//! reported values inside the lookback are withheld.

use super::{Indicator, Series};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.span.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        mask_warmup(ewm(&closes, self.span), self.lookback())
    }
}

/// Raw exponential smoothing over a pre-extracted series, seeded with the
/// first value. Every position is populated.
///
/// Used directly by MACD, whose signal line smooths the unmasked MACD recursion.
pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        result.push(next);
        prev = Some(next);
    }
    result
}

/// Report `None` for the first `lookback` positions.
pub(crate) fn mask_warmup(values: Vec<f64>, lookback: usize) -> Series {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i >= lookback).then_some(v))
        .collect()
}
