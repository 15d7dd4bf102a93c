//! Pipeline configuration: one TOML file, every field defaulted.

use std::path::Path;
use std::time::Duration;

use biaslab_core::backtest::BacktestConfig;
use biaslab_core::classifier::BiasThresholds;
use biaslab_core::filter::FilterConfig;
use biaslab_core::indicators::IndicatorConfig;
use biaslab_core::screen::ScreenCriteria;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Batch-level knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Tickers with fewer bars are skipped.
    pub min_rows: usize,
    /// Worker thread cap; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    /// Attach pattern tags to signal rows.
    pub patterns: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_rows: 50,
            workers: None,
            patterns: true,
        }
    }
}

/// Provider retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub max_attempts: usize,
    pub min_delay_ms: u64,
    /// Wall-clock budget across all attempts for one ticker.
    pub deadline_ms: u64,
}

impl RetryConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay_ms: 200,
            deadline_ms: 30_000,
        }
    }
}

/// Forward-return labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub horizons: Vec<usize>,
    pub label_threshold: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            horizons: vec![1, 2, 3],
            label_threshold: 0.02,
        }
    }
}

/// Complete configuration for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub indicators: IndicatorConfig,
    pub bias: BiasThresholds,
    pub filter: FilterConfig,
    pub backtest: BacktestConfig,
    pub pipeline: PipelineSettings,
    pub retry: RetryConfig,
    pub screen: ScreenCriteria,
    pub dataset: DatasetConfig,
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Content hash of the effective configuration.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let windows = [
            ("indicators.ema_fast", ind.ema_fast),
            ("indicators.ema_slow", ind.ema_slow),
            ("indicators.macd_fast", ind.macd_fast),
            ("indicators.macd_slow", ind.macd_slow),
            ("indicators.macd_signal", ind.macd_signal),
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.volume_window", ind.volume_window),
            ("indicators.atr_period", ind.atr_period),
            ("screen.atr_period", self.screen.atr_period),
            ("screen.rsi_period", self.screen.rsi_period),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(invalid(format!("{name} must be >= 1")));
        }
        if ind.ema_fast >= ind.ema_slow {
            return Err(invalid(format!(
                "indicators.ema_fast ({}) must be < ema_slow ({})",
                ind.ema_fast, ind.ema_slow
            )));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(invalid(format!(
                "indicators.macd_fast ({}) must be < macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }
        if self.screen.min_price > self.screen.max_price {
            return Err(invalid(format!(
                "screen.min_price ({}) exceeds max_price ({})",
                self.screen.min_price, self.screen.max_price
            )));
        }
        if self.dataset.horizons.is_empty() || self.dataset.horizons.contains(&0) {
            return Err(invalid("dataset.horizons must be non-empty and positive".into()));
        }
        if self.backtest.trading_days.is_nan() || self.backtest.trading_days <= 0.0 {
            return Err(invalid("backtest.trading_days must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be >= 1".into()));
        }
        if self.pipeline.workers == Some(0) {
            return Err(invalid("pipeline.workers must be >= 1 when set".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biaslab_core::backtest::BacktestMode;
    use biaslab_core::indicators::VwapPolicy;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.indicators.ema_fast, 9);
        assert_eq!(config.filter.volume_surge_min, 80.0);
        assert_eq!(config.pipeline.min_rows, 50);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.dataset.horizons, vec![1, 2, 3]);
    }

    #[test]
    fn partial_sections_override() {
        let config = PipelineConfig::from_toml(
            r#"
            [indicators]
            rsi_period = 10
            vwap = "session"

            [backtest]
            mode = "full_series"

            [pipeline]
            workers = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.indicators.rsi_period, 10);
        assert_eq!(config.indicators.ema_slow, 20);
        assert_eq!(config.indicators.vwap, VwapPolicy::Session);
        assert_eq!(config.backtest.mode, BacktestMode::FullSeries);
        assert_eq!(config.pipeline.workers, Some(4));
        assert!(config.pipeline.patterns);
    }

    #[test]
    fn rejects_inverted_ema_pair() {
        let err = PipelineConfig::from_toml("[indicators]\nema_fast = 30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_window() {
        let err = PipelineConfig::from_toml("[indicators]\nvolume_window = 0\n").unwrap_err();
        assert!(err.to_string().contains("volume_window"));
    }

    #[test]
    fn rejects_inverted_price_band() {
        let err = PipelineConfig::from_toml("[screen]\nmin_price = 50.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_horizons() {
        let err = PipelineConfig::from_toml("[dataset]\nhorizons = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = PipelineConfig::from_toml("[backtest]\nmode = \"weekly\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = PipelineConfig::default();
        config.pipeline.workers = Some(2);
        let rendered = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn config_hash_tracks_content() {
        let a = PipelineConfig::default();
        let mut b = a.clone();
        b.filter.volatility_min = 3.0;
        assert_eq!(a.config_hash(), PipelineConfig::default().config_hash());
        assert_ne!(a.config_hash(), b.config_hash());
    }
}
