//! Supervised training table: indicator features, bias and forward-return
//! labels for every row of every completed ticker.

use biaslab_core::classifier::BiasRule;
use biaslab_core::domain::{Bias, IndicatorRow};
use biaslab_core::labels::{forward_returns, label};
use serde::{Deserialize, Serialize};

use crate::config::DatasetConfig;
use crate::runner::{BatchReport, TickerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub row: IndicatorRow,
    pub bias: Bias,
    /// One entry per configured horizon.
    pub returns: Vec<Option<f64>>,
    pub label: bool,
}

/// Rows for one ticker, every indicator row classified by `rule`.
pub fn training_rows(
    result: &TickerResult,
    rule: &dyn BiasRule,
    config: &DatasetConfig,
) -> Vec<TrainingRow> {
    let biases = rule.classify_batch(&result.rows);
    let returns = forward_returns(&result.bars, &config.horizons);
    result
        .rows
        .iter()
        .zip(biases)
        .zip(returns)
        .map(|((row, bias), returns)| TrainingRow {
            row: row.clone(),
            bias,
            label: label(&returns, config.label_threshold),
            returns,
        })
        .collect()
}

/// Rows for every ticker in the report, in ticker order.
pub fn build_dataset(report: &BatchReport, rule: &dyn BiasRule) -> Vec<TrainingRow> {
    report
        .results
        .iter()
        .flat_map(|result| training_rows(result, rule, &report.config.dataset))
        .collect()
}
