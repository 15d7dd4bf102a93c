//! Volume surge.
//!
//! Surge[t] = (volume[t] - mean(volume, window)) / mean(volume, window) * 100
//! Lookback: window - 1. Zero rolling mean → no value.

use super::sma::rolling_mean;
use super::{Indicator, Series};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct VolumeSurge {
    window: usize,
    name: String,
}

impl VolumeSurge {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume window must be >= 1");
        Self {
            window,
            name: format!("volume_surge_{window}"),
        }
    }
}

impl Indicator for VolumeSurge {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Series {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        rolling_mean(&volumes, self.window)
            .into_iter()
            .zip(&volumes)
            .map(|(mean, &v)| mean.filter(|m| *m != 0.0).map(|m| (v - m) / m * 100.0))
            .collect()
    }
}
