//! BiasLab Runner: batch orchestration around `biaslab-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration with validation
//! - CSV ingestion and a synthetic data generator
//! - Collaborator traits: history providers (with retry), ticker sources,
//!   report sinks
//! - Parallel batch runner with per-ticker skip semantics
//! - Training-table assembly and CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod dataset;
pub mod export;
pub mod provider;
pub mod runner;
pub mod sink;
pub mod tickers;

pub use config::{ConfigError, DatasetConfig, PipelineConfig, PipelineSettings, RetryConfig};
pub use data_loader::{dataset_hash, load_csv, parse_csv, synthetic_bars, LoadError};
pub use dataset::{build_dataset, training_rows, TrainingRow};
pub use export::{load_manifest, save_artifacts, Manifest};
pub use provider::{
    CsvDirectoryProvider, HistoryProvider, ProviderError, Retrying, SyntheticProvider,
};
pub use runner::{
    BatchReport, Pipeline, ScreenReport, SkipReason, SkippedTicker, TickerResult, SCHEMA_VERSION,
};
pub use sink::{LogSink, ReportSink, SinkError};
pub use tickers::{DirectoryTickers, TickerList, TickerSource, Watchlist};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_is_send_sync() {
        assert_send::<Pipeline>();
        assert_sync::<Pipeline>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<TickerResult>();
        assert_sync::<TickerResult>();
        assert_send::<Manifest>();
        assert_sync::<Manifest>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<Retrying<CsvDirectoryProvider>>();
        assert_sync::<Retrying<CsvDirectoryProvider>>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
    }
}
