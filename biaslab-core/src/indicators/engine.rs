//! Indicator Engine: OHLCV series in, IndicatorRow series out.
//!
//! The engine is total over any sorted, non-negative input. Rows inside the
//! common warm-up window (the longest configured lookback) carry no derived
//! values at all, so a series no longer than the warm-up comes back all-`None`.

use serde::{Deserialize, Serialize};

use super::{
    Atr, Ema, Indicator, Macd, MacdOutput, Roc, Rsi, Series, Volatility, VolumeSurge, Vwap,
    VwapPolicy,
};
use super::vwap::deviation_pct;
use crate::domain::{IndicatorRow, PriceBar};

/// Window lengths and policies for every derived field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Fast EMA of the bias pair.
    pub ema_fast: usize,
    /// Slow EMA of the bias pair.
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    /// Rolling window for the volume-surge mean.
    pub volume_window: usize,
    pub atr_period: usize,
    pub vwap: VwapPolicy,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            volume_window: 20,
            atr_period: 14,
            vwap: VwapPolicy::Running,
        }
    }
}

/// Precomputes every indicator column for a ticker and assembles the rows.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    ema_fast: Ema,
    ema_slow: Ema,
    macd_line: Macd,
    macd_signal: Macd,
    rsi: Rsi,
    vwap: Vwap,
    price_action: Roc,
    volume_surge: VolumeSurge,
    volatility: Volatility,
    atr: Atr,
}

impl IndicatorEngine {
    /// # Panics
    /// Panics if any window in `config` is zero. Configuration loaded through
    /// the runner is validated before an engine is built.
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            ema_fast: Ema::new(config.ema_fast),
            ema_slow: Ema::new(config.ema_slow),
            macd_line: Macd::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
                MacdOutput::Line,
            ),
            macd_signal: Macd::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
                MacdOutput::Signal,
            ),
            rsi: Rsi::new(config.rsi_period),
            vwap: Vwap::new(config.vwap),
            price_action: Roc::new(1),
            volume_surge: VolumeSurge::new(config.volume_window),
            volatility: Volatility,
            atr: Atr::new(config.atr_period),
        }
    }

    fn indicators(&self) -> [&dyn Indicator; 10] {
        [
            &self.ema_fast,
            &self.ema_slow,
            &self.macd_line,
            &self.macd_signal,
            &self.rsi,
            &self.vwap,
            &self.price_action,
            &self.volume_surge,
            &self.volatility,
            &self.atr,
        ]
    }

    /// Number of leading rows without derived values.
    pub fn warmup(&self) -> usize {
        self.indicators()
            .iter()
            .map(|ind| ind.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Minimum series length that yields at least one defined row.
    pub fn min_bars(&self) -> usize {
        self.warmup() + 1
    }

    /// Compute the IndicatorRow series. Same length and order as `bars`.
    pub fn compute(&self, bars: &[PriceBar]) -> Vec<IndicatorRow> {
        let warmup = self.warmup();
        if bars.len() <= warmup {
            return bars.iter().cloned().map(IndicatorRow::undefined).collect();
        }

        let ema_fast = self.ema_fast.compute(bars);
        let ema_slow = self.ema_slow.compute(bars);
        let macd_line = self.macd_line.compute(bars);
        let macd_signal = self.macd_signal.compute(bars);
        let rsi = self.rsi.compute(bars);
        let vwap = self.vwap.compute(bars);
        let price_action = self.price_action.compute(bars);
        let volume_surge = self.volume_surge.compute(bars);
        let volatility = self.volatility.compute(bars);
        let atr = self.atr.compute(bars);

        let at = |series: &Series, i: usize| series.get(i).copied().flatten();

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if i < warmup {
                    return IndicatorRow::undefined(bar.clone());
                }
                let vwap_i = at(&vwap, i);
                IndicatorRow {
                    bar: bar.clone(),
                    ema_fast: at(&ema_fast, i),
                    ema_slow: at(&ema_slow, i),
                    macd_line: at(&macd_line, i),
                    macd_signal: at(&macd_signal, i),
                    rsi: at(&rsi, i),
                    vwap: vwap_i,
                    vwap_deviation_pct: deviation_pct(bar.close, vwap_i),
                    price_action_pct: at(&price_action, i),
                    volume_surge_pct: at(&volume_surge, i),
                    volatility_pct: at(&volatility, i),
                    atr: at(&atr, i),
                }
            })
            .collect()
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(&IndicatorConfig::default())
    }
}
