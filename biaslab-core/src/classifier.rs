//! Bias Classifier: IndicatorRow → {Long, Short, Neutral}.
//!
//! The rule set is a pluggable strategy. `ThresholdRule` is the default
//! screen; alternative rule sets implement `BiasRule` and can be swapped in
//! without touching the Indicator Engine or the Backtest Accountant.

use serde::{Deserialize, Serialize};

use crate::domain::{Bias, IndicatorRow};

/// Trait for bias rule sets.
///
/// Rules must be pure functions of the row: no portfolio, no neighbouring rows.
pub trait BiasRule: Send + Sync {
    /// Human-readable name (e.g., "threshold").
    fn name(&self) -> &str;

    /// Classify a single row.
    fn classify(&self, row: &IndicatorRow) -> Bias;

    /// Classify a whole column of rows.
    ///
    /// Dispatch happens once per batch; the per-row calls inside resolve
    /// statically for each implementation.
    fn classify_batch(&self, rows: &[IndicatorRow]) -> Vec<Bias> {
        rows.iter().map(|row| self.classify(row)).collect()
    }
}

/// Thresholds for the default rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasThresholds {
    /// Long needs VWAP deviation above this, Short below it.
    pub vwap_deviation: f64,
    /// Long needs RSI at or above this.
    pub rsi_long_min: f64,
    /// Short needs RSI at or below this.
    pub rsi_short_max: f64,
    /// Both directions need volume surge strictly above this.
    pub volume_surge_min: f64,
    /// Long needs price action strictly above this.
    pub price_action_long_floor: f64,
    /// Short needs price action strictly below this.
    pub price_action_short_ceiling: f64,
}

impl Default for BiasThresholds {
    fn default() -> Self {
        Self {
            vwap_deviation: 0.0,
            rsi_long_min: 50.0,
            rsi_short_max: 50.0,
            volume_surge_min: 50.0,
            price_action_long_floor: -5.0,
            price_action_short_ceiling: 5.0,
        }
    }
}

/// Fields the default rule needs, all defined.
#[derive(Debug)]
struct RuleInputs {
    vwap_deviation: f64,
    rsi: f64,
    macd_line: f64,
    macd_signal: f64,
    volume_surge: f64,
    ema_fast: f64,
    ema_slow: f64,
    price_action: f64,
}

impl RuleInputs {
    fn from_row(row: &IndicatorRow) -> Option<Self> {
        Some(Self {
            vwap_deviation: row.vwap_deviation_pct?,
            rsi: row.rsi?,
            macd_line: row.macd_line?,
            macd_signal: row.macd_signal?,
            volume_surge: row.volume_surge_pct?,
            ema_fast: row.ema_fast?,
            ema_slow: row.ema_slow?,
            price_action: row.price_action_pct?,
        })
    }
}

/// VWAP / RSI / MACD / volume / EMA-pair / price-action screen.
#[derive(Debug, Clone, Default)]
pub struct ThresholdRule {
    thresholds: BiasThresholds,
}

impl ThresholdRule {
    pub fn new(thresholds: BiasThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &BiasThresholds {
        &self.thresholds
    }

    fn is_long(&self, x: &RuleInputs) -> bool {
        let t = &self.thresholds;
        x.vwap_deviation > t.vwap_deviation
            && x.rsi >= t.rsi_long_min
            && x.macd_line > x.macd_signal
            && x.volume_surge > t.volume_surge_min
            && x.ema_fast > x.ema_slow
            && x.price_action > t.price_action_long_floor
    }

    fn is_short(&self, x: &RuleInputs) -> bool {
        let t = &self.thresholds;
        x.vwap_deviation < t.vwap_deviation
            && x.rsi <= t.rsi_short_max
            && x.macd_line < x.macd_signal
            && x.volume_surge > t.volume_surge_min
            && x.ema_fast < x.ema_slow
            && x.price_action < t.price_action_short_ceiling
    }
}

impl BiasRule for ThresholdRule {
    fn name(&self) -> &str {
        "threshold"
    }

    fn classify(&self, row: &IndicatorRow) -> Bias {
        let Some(inputs) = RuleInputs::from_row(row) else {
            return Bias::Neutral;
        };
        if self.is_long(&inputs) {
            Bias::Long
        } else if self.is_short(&inputs) {
            Bias::Short
        } else {
            Bias::Neutral
        }
    }
}
