//! Artifact export: CSV tables and the JSON run manifest.
//!
//! A batch writes into one output directory:
//! - `<TICKER>_backtest.csv`: every accounted row for that ticker
//! - `summary.csv`: Ticker, Total Return, Win Rate, Sharpe Ratio
//! - `signals.csv`: filtered rows with bias and pattern tags
//! - `manifest.json`: config, succeeded/skipped tickers, data hash
//!
//! The manifest carries a `schema_version`. Newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use biaslab_core::backtest::{Backtest, SummaryStats};
use biaslab_core::domain::IndicatorRow;
use biaslab_core::screen::ScreenSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::dataset::TrainingRow;
use crate::runner::{BatchReport, SkippedTicker, TickerResult, SCHEMA_VERSION};

// ─── Manifest ───────────────────────────────────────────────────────

/// Machine-readable record of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: String,
    pub config: PipelineConfig,
    pub config_hash: String,
    pub data_hash: String,
    pub synthetic: bool,
    pub succeeded: Vec<String>,
    pub skipped: Vec<SkippedTicker>,
    pub summaries: Vec<SummaryStats>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Manifest {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            config: report.config.clone(),
            config_hash: report.config.config_hash(),
            data_hash: report.data_hash.clone(),
            synthetic: report.synthetic,
            succeeded: report.results.iter().map(|r| r.ticker.clone()).collect(),
            skipped: report.skipped.clone(),
            summaries: report
                .results
                .iter()
                .map(|r| r.backtest.summary.clone())
                .collect(),
        }
    }
}

pub fn export_manifest(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

const INDICATOR_COLUMNS: [&str; 18] = [
    "date",
    "ticker",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "ema_fast",
    "ema_slow",
    "macd_line",
    "macd_signal",
    "rsi",
    "vwap",
    "vwap_deviation_pct",
    "price_action_pct",
    "volume_surge_pct",
    "volatility_pct",
    "atr",
];

fn fmt(v: f64) -> String {
    format!("{v:.6}")
}

/// Empty cell for "no value".
fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt).unwrap_or_default()
}

fn indicator_cells(row: &IndicatorRow) -> Vec<String> {
    let bar = &row.bar;
    let mut cells = vec![
        bar.date.to_string(),
        bar.ticker.clone(),
        fmt(bar.open),
        fmt(bar.high),
        fmt(bar.low),
        fmt(bar.close),
        format!("{:.0}", bar.volume),
    ];
    cells.extend(row.derived().into_iter().map(fmt_opt));
    cells
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Every BacktestRow field for one ticker.
pub fn export_backtest_csv(backtest: &Backtest) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = INDICATOR_COLUMNS.to_vec();
    header.extend([
        "bias",
        "next_close",
        "market_return",
        "position",
        "strategy_return",
        "equity_curve",
    ]);
    wtr.write_record(&header)?;

    for r in &backtest.rows {
        let mut cells = indicator_cells(&r.row);
        cells.extend([
            r.bias.map(|b| b.as_str().to_string()).unwrap_or_default(),
            fmt_opt(r.next_close),
            fmt_opt(r.market_return),
            r.position.to_string(),
            fmt(r.strategy_return),
            fmt(r.equity_curve),
        ]);
        wtr.write_record(&cells)?;
    }

    finish(wtr)
}

/// One line per ticker, four decimals.
pub fn export_summary_csv<'a>(
    summaries: impl IntoIterator<Item = &'a SummaryStats>,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Ticker", "Total Return", "Win Rate", "Sharpe Ratio"])?;
    for s in summaries {
        wtr.write_record([
            s.ticker.clone(),
            format!("{:.4}", s.total_return),
            format!("{:.4}", s.win_rate),
            format!("{:.4}", s.sharpe_ratio),
        ])?;
    }
    finish(wtr)
}

/// Filtered rows for every ticker with bias and pattern tags.
pub fn export_signals_csv(results: &[TickerResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = INDICATOR_COLUMNS.to_vec();
    header.extend(["Bias", "Rule Pattern", "Visual Pattern"]);
    wtr.write_record(&header)?;

    for result in results {
        for signal in &result.signals {
            let mut cells = indicator_cells(&signal.row);
            cells.extend([
                signal.bias.as_str().to_string(),
                result.tags.rule_pattern.clone(),
                result.tags.visual_pattern.clone(),
            ]);
            wtr.write_record(&cells)?;
        }
    }

    finish(wtr)
}

/// Training table with one return column per horizon plus the label.
pub fn export_dataset_csv(rows: &[TrainingRow], horizons: &[usize]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = INDICATOR_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.push("bias".into());
    header.extend(horizons.iter().map(|h| format!("return_{h}d")));
    header.push("label".into());
    wtr.write_record(&header)?;

    for t in rows {
        let mut cells = indicator_cells(&t.row);
        cells.push(t.bias.as_str().to_string());
        cells.extend(t.returns.iter().map(|r| fmt_opt(*r)));
        cells.push(u8::from(t.label).to_string());
        wtr.write_record(&cells)?;
    }

    finish(wtr)
}

/// Screen survivors, two decimals like a daily report.
pub fn export_screen_csv(snapshots: &[ScreenSnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Ticker",
        "Date",
        "Current Price",
        "Volume",
        "ATR",
        "Price Action %",
        "Volatility %",
        "RSI",
        "VWAP Deviation %",
        "Gap %",
        "Volume Surge %",
    ])?;
    let two = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_default();
    for s in snapshots {
        wtr.write_record([
            s.ticker.clone(),
            s.date.to_string(),
            format!("{:.2}", s.price),
            format!("{:.0}", s.volume),
            two(s.atr),
            two(s.price_action_pct),
            two(s.volatility_pct),
            two(s.rsi),
            two(s.vwap_deviation_pct),
            two(s.gap_pct),
            two(s.volume_surge_pct),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set for a batch into `output_dir`.
///
/// Returns the directory written to.
pub fn save_artifacts(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    for result in &report.results {
        let csv = export_backtest_csv(&result.backtest)
            .with_context(|| format!("failed to render backtest for {}", result.ticker))?;
        write_file(&output_dir.join(format!("{}_backtest.csv", result.ticker)), &csv)?;
    }

    let summary = export_summary_csv(report.results.iter().map(|r| &r.backtest.summary))?;
    write_file(&output_dir.join("summary.csv"), &summary)?;

    let signals = export_signals_csv(&report.results)?;
    write_file(&output_dir.join("signals.csv"), &signals)?;

    let manifest = export_manifest(&Manifest::from_report(report))?;
    write_file(&output_dir.join("manifest.json"), &manifest)?;

    Ok(output_dir.to_path_buf())
}

/// Load the manifest from an artifact directory.
pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest(&json)
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use biaslab_core::backtest::{backtest_signals, BacktestConfig};
    use biaslab_core::domain::{Bias, PriceBar, SignalRow};
    use chrono::NaiveDate;

    fn signal(day: u32, close: f64, bias: Bias) -> SignalRow {
        SignalRow {
            row: IndicatorRow::undefined(PriceBar {
                ticker: "ACME".into(),
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000.0,
            }),
            bias,
        }
    }

    #[test]
    fn summary_uses_four_decimals() {
        let stats = SummaryStats {
            ticker: "ACME".into(),
            total_return: 0.123456,
            win_rate: 0.5,
            sharpe_ratio: -1.0,
            rows: 4,
        };
        let csv = export_summary_csv([&stats]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Ticker,Total Return,Win Rate,Sharpe Ratio");
        assert_eq!(lines[1], "ACME,0.1235,0.5000,-1.0000");
    }

    #[test]
    fn backtest_csv_leaves_missing_values_empty() {
        let bt = backtest_signals(
            "ACME",
            &[signal(1, 100.0, Bias::Long), signal(2, 110.0, Bias::Short)],
            &BacktestConfig::default(),
        );
        let csv = export_backtest_csv(&bt).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("date,ticker,open"));
        assert!(header.ends_with("position,strategy_return,equity_curve"));

        let last: Vec<&str> = lines.last().unwrap().split(',').collect();
        assert_eq!(last.len(), 24);
        assert_eq!(last[7], "");
        assert_eq!(last[18], "Short");
        assert_eq!(last[19], "");
        assert_eq!(last[21], "-1");
    }

    fn empty_manifest() -> Manifest {
        Manifest {
            schema_version: SCHEMA_VERSION,
            generated_at: "2024-05-01T00:00:00Z".into(),
            config: PipelineConfig::default(),
            config_hash: PipelineConfig::default().config_hash(),
            data_hash: String::new(),
            synthetic: false,
            succeeded: vec![],
            skipped: vec![],
            summaries: vec![],
        }
    }

    #[test]
    fn manifest_roundtrip() {
        let manifest = empty_manifest();
        let json = export_manifest(&manifest).unwrap();
        assert_eq!(import_manifest(&json).unwrap(), manifest);
    }

    #[test]
    fn manifest_rejects_future_schema() {
        let mut manifest = empty_manifest();
        manifest.schema_version = SCHEMA_VERSION + 1;
        let json = export_manifest(&manifest).unwrap();
        let err = import_manifest(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }
}
