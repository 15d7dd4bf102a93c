//! Signal Filter: selects tradeable rows and attaches their bias.
//!
//! The filter is a pure predicate over already-computed fields. It never
//! touches indicator values; rows that pass are cloned into `SignalRow`s.

use serde::{Deserialize, Serialize};

use crate::classifier::BiasRule;
use crate::domain::{IndicatorRow, SignalRow};

/// Activity and volatility floors for a tradeable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum volume surge %, inclusive.
    pub volume_surge_min: f64,
    /// Minimum intraday volatility %, inclusive.
    pub volatility_min: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            volume_surge_min: 80.0,
            volatility_min: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalFilter {
    config: FilterConfig,
}

impl SignalFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// True when both fields are defined and meet their floors.
    pub fn passes(&self, row: &IndicatorRow) -> bool {
        match (row.volume_surge_pct, row.volatility_pct) {
            (Some(surge), Some(volatility)) => {
                surge >= self.config.volume_surge_min && volatility >= self.config.volatility_min
            }
            _ => false,
        }
    }

    /// Select passing rows, in order, and classify them as one batch.
    ///
    /// An empty result is valid: no tradeable candidates.
    pub fn select(&self, rows: &[IndicatorRow], rule: &dyn BiasRule) -> Vec<SignalRow> {
        let selected: Vec<IndicatorRow> = rows.iter().filter(|r| self.passes(r)).cloned().collect();
        let biases = rule.classify_batch(&selected);
        selected
            .into_iter()
            .zip(biases)
            .map(|(row, bias)| SignalRow { row, bias })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::row_with;
    use crate::classifier::ThresholdRule;
    use crate::domain::Bias;

    #[test]
    fn passes_on_thresholds_inclusive() {
        let filter = SignalFilter::default();
        let mut row = row_with(1.0, 60.0, (0.2, 0.1), 80.0, (10.1, 10.0), 1.0);
        row.volatility_pct = Some(2.0);
        assert!(filter.passes(&row));
        row.volatility_pct = Some(1.99);
        assert!(!filter.passes(&row));
    }

    #[test]
    fn undefined_fields_never_pass() {
        let filter = SignalFilter::default();
        let mut row = row_with(1.0, 60.0, (0.2, 0.1), 120.0, (10.1, 10.0), 1.0);
        row.volume_surge_pct = None;
        assert!(!filter.passes(&row));
    }

    #[test]
    fn select_attaches_bias_and_keeps_values() {
        let rows = vec![
            row_with(1.2, 62.0, (0.4, 0.1), 120.0, (10.2, 10.0), 3.0),
            row_with(-1.2, 38.0, (-0.4, -0.1), 30.0, (9.8, 10.0), -3.0),
            row_with(-1.2, 38.0, (-0.4, -0.1), 95.0, (9.8, 10.0), -3.0),
        ];
        let signals = SignalFilter::default().select(&rows, &ThresholdRule::default());
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].bias, Bias::Long);
        assert_eq!(signals[1].bias, Bias::Short);
        assert_eq!(signals[0].row, rows[0]);
        assert_eq!(signals[1].row, rows[2]);
    }

    #[test]
    fn select_can_return_nothing() {
        let rows = vec![row_with(1.2, 62.0, (0.4, 0.1), 10.0, (10.2, 10.0), 3.0)];
        let filter = SignalFilter::new(FilterConfig {
            volume_surge_min: 80.0,
            volatility_min: 2.0,
        });
        assert!(filter.select(&rows, &ThresholdRule::default()).is_empty());
    }
}
