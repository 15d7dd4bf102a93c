//! Pipeline orchestrator: fetch, compute, classify, filter, tag, account.
//!
//! Two entry points:
//! - `Pipeline::process()`: one ticker from pre-loaded bars, no I/O.
//! - `Pipeline::run_batch()`: many tickers through a `HistoryProvider`, in
//!   parallel, with per-ticker failures degraded to skips.
//!
//! A batch always completes. Results are sorted by ticker so the report does
//! not depend on worker scheduling.

use std::time::Instant;

use biaslab_core::backtest::{self, Backtest};
use biaslab_core::classifier::{BiasRule, ThresholdRule};
use biaslab_core::domain::{is_sorted_by_date, IndicatorRow, PriceBar, SignalRow};
use biaslab_core::filter::SignalFilter;
use biaslab_core::indicators::IndicatorEngine;
use biaslab_core::patterns::{ChartTagger, NullTagger, PatternTagger, PatternTags};
use biaslab_core::screen::{self, RejectReason, ScreenOutcome, ScreenSnapshot};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::dataset_hash;
use crate::provider::HistoryProvider;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Why a ticker is absent from the results.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("only {rows} rows, need {min}")]
    InsufficientRows { rows: usize, min: usize },
    #[error("invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },
    #[error("pattern tagging failed: {0}")]
    Tagging(String),
    #[error("screened out: {0}")]
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

/// Everything computed for one ticker.
#[derive(Debug, Clone)]
pub struct TickerResult {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    pub rows: Vec<IndicatorRow>,
    pub signals: Vec<SignalRow>,
    pub tags: PatternTags,
    pub backtest: Backtest,
}

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub config: PipelineConfig,
    /// Sorted by ticker.
    pub results: Vec<TickerResult>,
    /// Sorted by ticker.
    pub skipped: Vec<SkippedTicker>,
    /// BLAKE3 over the bars of every completed ticker.
    pub data_hash: String,
    pub synthetic: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn attempted(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    pub fn signal_count(&self) -> usize {
        self.results.iter().map(|r| r.signals.len()).sum()
    }
}

/// Outcome of a screening pass.
#[derive(Debug, Clone, Default)]
pub struct ScreenReport {
    /// Sorted by ticker.
    pub passed: Vec<ScreenSnapshot>,
    /// Sorted by ticker.
    pub rejected: Vec<SkippedTicker>,
}

/// The per-ticker pipeline with its components built from one config.
pub struct Pipeline {
    config: PipelineConfig,
    engine: IndicatorEngine,
    rule: Box<dyn BiasRule>,
    filter: SignalFilter,
    tagger: Box<dyn PatternTagger>,
    synthetic: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tagger: Box<dyn PatternTagger> = if config.pipeline.patterns {
            Box::new(ChartTagger::default())
        } else {
            Box::new(NullTagger)
        };
        Ok(Self {
            engine: IndicatorEngine::new(&config.indicators),
            rule: Box::new(ThresholdRule::new(config.bias.clone())),
            filter: SignalFilter::new(config.filter.clone()),
            tagger,
            synthetic: false,
            config,
        })
    }

    /// Swap the bias rule set.
    pub fn with_rule(mut self, rule: Box<dyn BiasRule>) -> Self {
        self.rule = rule;
        self
    }

    /// Swap the pattern tagger.
    pub fn with_tagger(mut self, tagger: Box<dyn PatternTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    /// Mark results as produced from synthetic data.
    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rule(&self) -> &dyn BiasRule {
        self.rule.as_ref()
    }

    /// Run one ticker's pre-loaded bars through the whole pipeline.
    pub fn process(
        &self,
        ticker: &str,
        mut bars: Vec<PriceBar>,
    ) -> Result<TickerResult, SkipReason> {
        if !is_sorted_by_date(&bars) {
            bars.sort_by_key(|b| b.date);
            bars.dedup_by_key(|b| b.date);
        }
        if let Some((date, err)) = bars
            .iter()
            .find_map(|b| b.validate().err().map(|e| (b.date, e)))
        {
            return Err(SkipReason::InvalidBar {
                date,
                reason: err.to_string(),
            });
        }
        let min = self.config.pipeline.min_rows;
        if bars.len() < min {
            return Err(SkipReason::InsufficientRows {
                rows: bars.len(),
                min,
            });
        }

        let rows = self.engine.compute(&bars);
        debug!(ticker, rows = rows.len(), warmup = self.engine.warmup(), "indicators computed");

        let signals = self.filter.select(&rows, self.rule.as_ref());
        debug!(ticker, signals = signals.len(), "signals selected");

        let tags = if signals.is_empty() {
            PatternTags::default()
        } else {
            self.tagger
                .tag(ticker, &bars)
                .map_err(|e| SkipReason::Tagging(e.to_string()))?
        };

        let backtest = backtest::run(ticker, &rows, &signals, &self.config.backtest);
        debug!(
            ticker,
            total_return = backtest.summary.total_return,
            sharpe = backtest.summary.sharpe_ratio,
            "backtest complete"
        );

        Ok(TickerResult {
            ticker: ticker.to_string(),
            bars,
            rows,
            signals,
            tags,
            backtest,
        })
    }

    /// Fetch and process one ticker.
    pub fn run_ticker(
        &self,
        provider: &dyn HistoryProvider,
        ticker: &str,
    ) -> Result<TickerResult, SkipReason> {
        let bars = provider
            .fetch(ticker)
            .map_err(|e| SkipReason::Fetch(e.to_string()))?;
        self.process(ticker, bars)
    }

    /// Run every ticker, in parallel when more than one worker is available.
    pub fn run_batch(&self, provider: &dyn HistoryProvider, tickers: &[String]) -> BatchReport {
        let started = Instant::now();
        info!(
            tickers = tickers.len(),
            provider = provider.name(),
            "batch started"
        );

        let outcomes = self.map_tickers(tickers, |ticker| self.run_ticker(provider, ticker));

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(reason) => {
                    warn!(ticker = %ticker, reason = %reason, "ticker skipped");
                    skipped.push(SkippedTicker { ticker, reason });
                }
            }
        }

        let data_hash = dataset_hash(
            results
                .iter()
                .map(|r| (r.ticker.as_str(), r.bars.as_slice())),
        );

        let report = BatchReport {
            config: self.config.clone(),
            results,
            skipped,
            data_hash,
            synthetic: self.synthetic,
        };
        info!(
            succeeded = report.succeeded(),
            skipped = report.skipped.len(),
            signals = report.signal_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        report
    }

    /// Screen every ticker on its latest bar.
    pub fn screen_batch(&self, provider: &dyn HistoryProvider, tickers: &[String]) -> ScreenReport {
        info!(tickers = tickers.len(), "screen started");
        let outcomes = self.map_tickers(tickers, |ticker| {
            let bars = provider
                .fetch(ticker)
                .map_err(|e| SkipReason::Fetch(e.to_string()))?;
            match screen::screen(ticker, &bars, &self.config.screen) {
                ScreenOutcome::Passed(snapshot) => Ok(snapshot),
                ScreenOutcome::Rejected { reason, .. } => Err(SkipReason::Rejected(reason)),
            }
        });

        let mut report = ScreenReport::default();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(snapshot) => report.passed.push(snapshot),
                Err(reason) => {
                    debug!(ticker = %ticker, reason = %reason, "ticker screened out");
                    report.rejected.push(SkippedTicker { ticker, reason });
                }
            }
        }
        info!(
            passed = report.passed.len(),
            rejected = report.rejected.len(),
            "screen finished"
        );
        report
    }

    /// Apply `f` to each ticker on the configured pool; output sorted by ticker.
    fn map_tickers<T, F>(&self, tickers: &[String], f: F) -> Vec<(String, Result<T, SkipReason>)>
    where
        T: Send,
        F: Fn(&str) -> Result<T, SkipReason> + Sync,
    {
        let run = || -> Vec<(String, Result<T, SkipReason>)> {
            tickers
                .par_iter()
                .map(|ticker| (ticker.clone(), f(ticker)))
                .collect()
        };

        let mut outcomes = match self.config.pipeline.workers {
            Some(1) => tickers
                .iter()
                .map(|ticker| (ticker.clone(), f(ticker)))
                .collect(),
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!(error = %e, "falling back to the global rayon pool");
                    run()
                }
            },
            None => run(),
        };
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        outcomes
    }
}
