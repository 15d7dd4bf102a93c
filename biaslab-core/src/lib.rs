//! BiasLab Core: indicator engine, bias classification, signal filtering and
//! backtest accounting.
//!
//! This crate is pure computation over in-memory bar series:
//! - Domain types (price bars, bias, indicator and signal rows)
//! - Indicator engine with an explicit "no value" marker during warm-up
//! - Threshold bias rule and the volume/volatility signal filter
//! - Per-ticker backtest accountant and summary statistics
//! - Pattern taggers, single-day screen, forward-return labels
//!
//! I/O, retries, concurrency and export live in `biaslab-runner`.

pub mod backtest;
pub mod classifier;
pub mod domain;
pub mod filter;
pub mod indicators;
pub mod labels;
pub mod patterns;
pub mod screen;

pub use backtest::{Backtest, BacktestConfig, BacktestMode, BacktestRow, SummaryStats};
pub use classifier::{BiasRule, BiasThresholds, ThresholdRule};
pub use domain::{Bias, IndicatorRow, PriceBar, SignalRow};
pub use filter::{FilterConfig, SignalFilter};
pub use indicators::{IndicatorConfig, IndicatorEngine};
pub use patterns::{ChartTagger, NullTagger, PatternTagger, PatternTags, TaggerError};
pub use screen::{screen, ScreenCriteria, ScreenOutcome, ScreenSnapshot};
