//! History providers: where a ticker's bars come from.
//!
//! The HistoryProvider trait abstracts over data sources (CSV directory,
//! synthetic generator) so the pipeline can swap implementations and tests
//! can inject failures. `Retrying` layers exponential backoff over any of
//! them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use backon::{BlockingRetryable, ExponentialBuilder};
use biaslab_core::domain::PriceBar;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

use crate::config::RetryConfig;
use crate::data_loader::{self, LoadError};

/// Structured errors for history fetches.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no history for ticker '{ticker}'")]
    NotFound { ticker: String },

    #[error("load {ticker}: {source}")]
    Load {
        ticker: String,
        #[source]
        source: LoadError,
    },

    #[error("invalid ticker '{ticker}'")]
    InvalidTicker { ticker: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("gave up on {ticker} after {elapsed_ms} ms: {last}")]
    DeadlineExceeded {
        ticker: String,
        elapsed_ms: u64,
        last: String,
    },
}

impl ProviderError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Unavailable(_) => true,
            ProviderError::Load { source, .. } => matches!(source, LoadError::Io { .. }),
            ProviderError::NotFound { .. }
            | ProviderError::InvalidTicker { .. }
            | ProviderError::DeadlineExceeded { .. } => false,
        }
    }
}

/// Trait for bar history sources.
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily bars for `ticker`, ascending by date.
    fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError>;
}

/// Reads `<dir>/<TICKER>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The ticker must name a file directly inside the directory.
    fn path_for(&self, ticker: &str) -> Result<PathBuf, ProviderError> {
        if ticker.is_empty() || ticker.contains(['/', '\\']) || ticker.contains("..") {
            return Err(ProviderError::InvalidTicker {
                ticker: ticker.to_string(),
            });
        }
        Ok(self.dir.join(format!("{ticker}.csv")))
    }
}

impl HistoryProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
        let path = self.path_for(ticker)?;
        if !path.is_file() {
            return Err(ProviderError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        data_loader::load_csv(&path, ticker).map_err(|source| ProviderError::Load {
            ticker: ticker.to_string(),
            source,
        })
    }
}

/// Deterministic random-walk bars for development runs.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl HistoryProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
        Ok(data_loader::synthetic_bars(ticker, self.start, self.end))
    }
}

/// Exponential backoff around another provider, bounded by an attempt count
/// and a wall-clock deadline. `NotFound` fails immediately.
#[derive(Debug, Clone)]
pub struct Retrying<P> {
    inner: P,
    policy: RetryConfig,
}

impl<P: HistoryProvider> Retrying<P> {
    pub fn new(inner: P, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: HistoryProvider> HistoryProvider for Retrying<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
        let started = Instant::now();
        let deadline = self.policy.deadline();
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.policy.min_delay())
            .with_max_times(self.policy.max_attempts.saturating_sub(1));

        let result = (|| self.inner.fetch(ticker))
            .retry(backoff)
            .sleep(std::thread::sleep)
            .when(|e: &ProviderError| e.is_retryable() && started.elapsed() < deadline)
            .notify(|e: &ProviderError, delay| {
                warn!(ticker, error = %e, delay_ms = delay.as_millis() as u64, "retrying fetch");
            })
            .call();

        match result {
            Err(e) if e.is_retryable() && started.elapsed() >= deadline => {
                Err(ProviderError::DeadlineExceeded {
                    ticker: ticker.to_string(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    last: e.to_string(),
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails `failures` times with `Unavailable`, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl HistoryProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(ProviderError::Unavailable(format!("attempt {n}")))
            } else {
                Ok(data_loader::synthetic_bars(
                    ticker,
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                ))
            }
        }
    }

    struct Missing {
        calls: AtomicUsize,
    }

    impl HistoryProvider for Missing {
        fn name(&self) -> &str {
            "missing"
        }

        fn fetch(&self, ticker: &str) -> Result<Vec<PriceBar>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::NotFound {
                ticker: ticker.to_string(),
            })
        }
    }

    fn fast_policy(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            min_delay_ms: 1,
            deadline_ms: 5_000,
        }
    }

    #[test]
    fn retries_transient_failures() {
        let provider = Retrying::new(
            Flaky {
                failures: 2,
                calls: AtomicUsize::new(0),
            },
            fast_policy(3),
        );
        let bars = provider.fetch("ACME").unwrap();
        assert!(!bars.is_empty());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let provider = Retrying::new(
            Flaky {
                failures: 10,
                calls: AtomicUsize::new(0),
            },
            fast_policy(2),
        );
        let err = provider.fetch("ACME").unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn not_found_is_not_retried() {
        let provider = Retrying::new(
            Missing {
                calls: AtomicUsize::new(0),
            },
            fast_policy(5),
        );
        let err = provider.fetch("NOPE").unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_deadline_reports_timeout() {
        let provider = Retrying::new(
            Flaky {
                failures: 10,
                calls: AtomicUsize::new(0),
            },
            RetryConfig {
                max_attempts: 5,
                min_delay_ms: 1,
                deadline_ms: 0,
            },
        );
        let err = provider.fetch("ACME").unwrap_err();
        assert!(matches!(err, ProviderError::DeadlineExceeded { .. }));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn csv_provider_reports_missing_file() {
        let provider =
            CsvDirectoryProvider::new(std::env::temp_dir().join("biaslab-no-such-dir"));
        assert!(matches!(
            provider.fetch("ACME"),
            Err(ProviderError::NotFound { .. })
        ));
    }

    #[test]
    fn csv_provider_rejects_paths_outside_its_directory() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(
            root.path().join("SECRET.csv"),
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,1\n",
        )
        .unwrap();

        let provider = CsvDirectoryProvider::new(&data);
        for ticker in ["../SECRET", "..\\SECRET", "sub/ACME", "..", ""] {
            let result = provider.fetch(ticker);
            assert!(
                matches!(result, Err(ProviderError::InvalidTicker { .. })),
                "accepted {ticker:?}"
            );
        }
        assert!(!ProviderError::InvalidTicker { ticker: "..".into() }.is_retryable());
    }

    #[test]
    fn invalid_ticker_is_not_retried() {
        let provider = Retrying::new(
            CsvDirectoryProvider::new(std::env::temp_dir()),
            fast_policy(5),
        );
        assert!(matches!(
            provider.fetch("../etc/passwd"),
            Err(ProviderError::InvalidTicker { .. })
        ));
    }
}
