//! BDD tests for batch runs over the provider traits.
//!
//! - Failed fetches skip a ticker without aborting the batch
//! - Results do not depend on the worker count
//! - Pattern tagging can be switched off from TOML
//! - Training rows cover every bar

use std::sync::atomic::{AtomicUsize, Ordering};

use biaslab_core::domain::PriceBar;
use biaslab_runner::{
    build_dataset, synthetic_bars, HistoryProvider, Pipeline, PipelineConfig, ProviderError,
    RetryConfig, Retrying, SkipReason, SyntheticProvider, TickerList, TickerSource,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn two_years() -> SyntheticProvider {
    SyntheticProvider::new(d(2022, 1, 3), d(2023, 12, 29))
}

fn tickers(names: &[&str]) -> Vec<String> {
    TickerList(names.iter().map(|s| s.to_string()).collect())
        .tickers()
        .unwrap()
}

/// Serves synthetic bars except for tickers it was told to lose.
struct PartlyMissing {
    missing: &'static str,
    calls: AtomicUsize,
}

impl HistoryProvider for PartlyMissing {
    fn name(&self) -> &str {
        "partly-missing"
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ticker == self.missing {
            return Err(ProviderError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        Ok(synthetic_bars(ticker, d(2022, 1, 3), d(2023, 12, 29)))
    }
}

#[test]
fn bdd_scenario_failed_fetch_skips_only_that_ticker() {
    // GIVEN a provider that has no history for MSFT
    let provider = Retrying::new(
        PartlyMissing {
            missing: "MSFT",
            calls: AtomicUsize::new(0),
        },
        RetryConfig {
            max_attempts: 3,
            min_delay_ms: 1,
            deadline_ms: 1_000,
        },
    );
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    // WHEN a batch runs over three tickers
    let report = pipeline.run_batch(&provider, &tickers(&["AAPL", "MSFT", "NVDA"]));

    // THEN the other two complete and MSFT is recorded as skipped
    let done: Vec<&str> = report.results.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(done, vec!["AAPL", "NVDA"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].ticker, "MSFT");
    assert!(matches!(report.skipped[0].reason, SkipReason::Fetch(_)));

    // AND NotFound was not retried
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
}

#[test]
fn bdd_scenario_worker_count_does_not_change_results() {
    // GIVEN the same tickers run serially and on four workers
    let names = tickers(&["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]);
    let mut serial = PipelineConfig::default();
    serial.pipeline.workers = Some(1);
    let mut parallel = PipelineConfig::default();
    parallel.pipeline.workers = Some(4);

    // WHEN both batches run
    let a = Pipeline::new(serial).unwrap().run_batch(&two_years(), &names);
    let b = Pipeline::new(parallel).unwrap().run_batch(&two_years(), &names);

    // THEN every ticker's backtest and the data hash are identical
    assert_eq!(a.succeeded(), names.len());
    assert_eq!(a.data_hash, b.data_hash);
    for (x, y) in a.results.iter().zip(&b.results) {
        assert_eq!(x.ticker, y.ticker);
        assert_eq!(x.signals, y.signals);
        assert_eq!(x.backtest, y.backtest);
    }
}

#[test]
fn bdd_scenario_patterns_disabled_from_toml() {
    // GIVEN a TOML config that turns tagging off
    let config = PipelineConfig::from_toml(
        r#"
[pipeline]
patterns = false
workers = 2
"#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    // WHEN a batch runs
    let report = pipeline.run_batch(&two_years(), &tickers(&["AAA", "BBB"]));

    // THEN every ticker carries the "None" tags
    assert_eq!(report.succeeded(), 2);
    for result in &report.results {
        assert_eq!(result.tags.rule_pattern, "None");
        assert_eq!(result.tags.visual_pattern, "None");
    }
}

#[test]
fn bdd_scenario_dataset_covers_every_bar() {
    // GIVEN a completed batch
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run_batch(&two_years(), &tickers(&["AAA", "BBB"]));

    // WHEN the training table is assembled
    let rows = build_dataset(&report, pipeline.rule());

    // THEN there is one row per bar with one return per horizon
    let bars: usize = report.results.iter().map(|r| r.bars.len()).sum();
    assert_eq!(rows.len(), bars);
    assert!(rows.iter().all(|r| r.returns.len() == 3));

    // AND labels agree with the two percent threshold
    for row in &rows {
        let expected = row.returns.iter().flatten().any(|&r| r > 0.02);
        assert_eq!(row.label, expected);
    }
}
