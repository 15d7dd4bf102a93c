//! Report delivery once a batch's artifacts are on disk.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::runner::BatchReport;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("deliver report via {sink}: {reason}")]
    Delivery { sink: String, reason: String },
}

/// Hands a finished batch to its audience.
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;
    fn deliver(&self, report: &BatchReport, artifacts: &Path) -> Result<(), SinkError>;
}

/// Logs the batch summary and the best performers.
#[derive(Debug, Clone)]
pub struct LogSink {
    /// Tickers listed by total return.
    pub top: usize,
}

impl Default for LogSink {
    fn default() -> Self {
        Self { top: 5 }
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, report: &BatchReport, artifacts: &Path) -> Result<(), SinkError> {
        info!(
            succeeded = report.succeeded(),
            skipped = report.skipped.len(),
            signals = report.signal_count(),
            artifacts = %artifacts.display(),
            "report ready"
        );

        let mut ranked: Vec<_> = report.results.iter().map(|r| &r.backtest.summary).collect();
        ranked.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));
        for s in ranked.into_iter().take(self.top) {
            info!(
                ticker = %s.ticker,
                total_return = s.total_return,
                win_rate = s.win_rate,
                sharpe = s.sharpe_ratio,
                "top performer"
            );
        }
        Ok(())
    }
}
