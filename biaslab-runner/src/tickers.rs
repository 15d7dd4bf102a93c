//! Ticker sources: which tickers a batch covers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::provider::ProviderError;

/// Produces the ticker list for a batch.
pub trait TickerSource: Send + Sync {
    fn tickers(&self) -> Result<Vec<String>, ProviderError>;
}

/// Every `*.csv` file stem in a directory, sorted.
#[derive(Debug, Clone)]
pub struct DirectoryTickers {
    dir: PathBuf,
}

impl DirectoryTickers {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TickerSource for DirectoryTickers {
    fn tickers(&self) -> Result<Vec<String>, ProviderError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ProviderError::Unavailable(format!("list {}: {e}", self.dir.display()))
        })?;
        let mut tickers: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// A fixed list, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct TickerList(pub Vec<String>);

impl TickerSource for TickerList {
    fn tickers(&self) -> Result<Vec<String>, ProviderError> {
        let mut tickers = self.0.clone();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

/// Named groups of tickers stored as TOML:
///
/// ```toml
/// [groups]
/// tech = ["AAPL", "MSFT"]
/// energy = ["XOM"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Watchlist {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(|v| v.as_slice())
    }

    /// Distinct tickers across all groups, sorted.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut all: Vec<String> = self.groups.values().flatten().cloned().collect();
        all.sort();
        all.dedup();
        all
    }
}

impl TickerSource for Watchlist {
    fn tickers(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.all_tickers())
    }
}
