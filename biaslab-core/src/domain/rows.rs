//! Derived row types flowing through the pipeline.

use serde::{Deserialize, Serialize};

use super::bar::PriceBar;
use super::bias::Bias;

/// A PriceBar plus every derived indicator field.
///
/// `None` marks a value that is not computable: warm-up positions and
/// divisions by zero. Nothing is silently zero-filled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub vwap: Option<f64>,
    pub vwap_deviation_pct: Option<f64>,
    pub price_action_pct: Option<f64>,
    pub volume_surge_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub atr: Option<f64>,
}

impl IndicatorRow {
    /// A row with no derived values.
    pub fn undefined(bar: PriceBar) -> Self {
        Self {
            bar,
            ema_fast: None,
            ema_slow: None,
            macd_line: None,
            macd_signal: None,
            rsi: None,
            vwap: None,
            vwap_deviation_pct: None,
            price_action_pct: None,
            volume_surge_pct: None,
            volatility_pct: None,
            atr: None,
        }
    }

    /// Every derived field, in a fixed order. Used by exports and checks.
    pub fn derived(&self) -> [Option<f64>; 11] {
        [
            self.ema_fast,
            self.ema_slow,
            self.macd_line,
            self.macd_signal,
            self.rsi,
            self.vwap,
            self.vwap_deviation_pct,
            self.price_action_pct,
            self.volume_surge_pct,
            self.volatility_pct,
            self.atr,
        ]
    }

    /// True when no derived field has a value.
    pub fn is_undefined(&self) -> bool {
        self.derived().iter().all(Option::is_none)
    }
}

/// An IndicatorRow that passed the signal filter, with its bias attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub row: IndicatorRow,
    pub bias: Bias,
}
