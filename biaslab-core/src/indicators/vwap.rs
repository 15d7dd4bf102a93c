//! Volume-Weighted Average Price (VWAP).
//!
//! VWAP[t] = sum(typical_price * volume) / sum(volume), typical = (H + L + C) / 3.
//! Running policy accumulates from the start of the series. Session policy
//! restarts the sums whenever the bar date changes, so on daily bars every bar
//! is its own session.
//! Lookback: 0. Zero cumulative volume → no value.

use serde::{Deserialize, Serialize};

use super::{Indicator, Series};
use crate::domain::PriceBar;

/// When the VWAP accumulators reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapPolicy {
    #[default]
    Running,
    Session,
}

#[derive(Debug, Clone)]
pub struct Vwap {
    policy: VwapPolicy,
    name: String,
}

impl Vwap {
    pub fn new(policy: VwapPolicy) -> Self {
        let name = match policy {
            VwapPolicy::Running => "vwap_running".to_string(),
            VwapPolicy::Session => "vwap_session".to_string(),
        };
        Self { policy, name }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        let mut pv = 0.0;
        let mut vol = 0.0;
        let mut result = Vec::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            let new_session = i > 0 && bars[i - 1].date != bar.date;
            if self.policy == VwapPolicy::Session && new_session {
                pv = 0.0;
                vol = 0.0;
            }
            pv += bar.typical_price() * bar.volume;
            vol += bar.volume;
            result.push((vol > 0.0).then(|| pv / vol));
        }
        result
    }
}

/// Percent deviation of close from VWAP: (close - vwap) / vwap * 100.
pub fn deviation_pct(close: f64, vwap: Option<f64>) -> Option<f64> {
    vwap.filter(|v| *v != 0.0)
        .map(|v| (close - v) / v * 100.0)
}
