//! BiasLab CLI: batch runs, screening, dataset export and config scaffolding.
//!
//! Commands:
//! - `run`: indicators, bias, patterns and backtest over every ticker
//! - `screen`: latest-bar liquidity and volatility screen
//! - `dataset`: supervised training table with forward-return labels
//! - `init-config`: write the default TOML configuration

use anyhow::{bail, Context, Result};
use biaslab_runner::export::{export_dataset_csv, export_screen_csv, write_file};
use biaslab_runner::{
    build_dataset, save_artifacts, BatchReport, CsvDirectoryProvider, DirectoryTickers,
    HistoryProvider, LogSink, Pipeline, PipelineConfig, ReportSink, Retrying, SyntheticProvider,
    TickerList, TickerSource, Watchlist,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "biaslab", about = "BiasLab: daily bias signals and backtests")]
struct Cli {
    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where tickers and their bars come from.
#[derive(Args)]
struct Source {
    /// Directory of `<TICKER>.csv` files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restrict the run to these tickers.
    #[arg(long, num_args = 1..)]
    tickers: Vec<String>,

    /// Watchlist TOML of named ticker groups.
    #[arg(long)]
    watchlist: Option<PathBuf>,

    /// Group within the watchlist. All groups when omitted.
    #[arg(long, requires = "watchlist")]
    group: Option<String>,

    /// Use deterministic synthetic bars instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// First synthetic date (YYYY-MM-DD). Defaults to two years before --end.
    #[arg(long)]
    start: Option<String>,

    /// Last synthetic date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators, classify bias, tag patterns and backtest.
    Run {
        #[command(flatten)]
        source: Source,

        /// Output directory for CSV and manifest artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Screen every ticker on its latest bar.
    Screen {
        #[command(flatten)]
        source: Source,

        /// Output CSV path.
        #[arg(long, default_value = "screen.csv")]
        output: PathBuf,
    },
    /// Build the labelled training table.
    Dataset {
        #[command(flatten)]
        source: Source,

        /// Output CSV path.
        #[arg(long, default_value = "dataset.csv")]
        output: PathBuf,
    },
    /// Write the default configuration as TOML.
    InitConfig {
        /// Output path.
        #[arg(long, default_value = "biaslab.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Run { source, output_dir } => run_cmd(&source, &output_dir),
        Commands::Screen { source, output } => screen_cmd(&source, &output),
        Commands::Dataset { source, output } => dataset_cmd(&source, &output),
        Commands::InitConfig { output, force } => init_config_cmd(&output, force),
    }
}

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so stdout stays clean.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Resolved inputs for any batch command.
struct Inputs {
    pipeline: Pipeline,
    provider: Box<dyn HistoryProvider>,
    tickers: Vec<String>,
}

fn resolve(source: &Source) -> Result<Inputs> {
    let config = match &source.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let pipeline = Pipeline::new(config.clone())
        .context("invalid pipeline configuration")?
        .synthetic(source.synthetic);

    let provider: Box<dyn HistoryProvider> = if source.synthetic {
        let end = parse_date_arg(source.end.as_deref())?
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let start = parse_date_arg(source.start.as_deref())?
            .unwrap_or_else(|| end - chrono::Duration::days(365 * 2));
        if start >= end {
            bail!("--start must be before --end");
        }
        Box::new(SyntheticProvider::new(start, end))
    } else {
        let Some(dir) = &source.data_dir else {
            bail!("--data-dir is required unless --synthetic is set");
        };
        Box::new(Retrying::new(CsvDirectoryProvider::new(dir), config.retry.clone()))
    };

    let tickers = if !source.tickers.is_empty() {
        TickerList(source.tickers.clone()).tickers()?
    } else if let Some(path) = &source.watchlist {
        let watchlist = Watchlist::from_file(path)
            .with_context(|| format!("failed to load watchlist {}", path.display()))?;
        match &source.group {
            Some(group) => TickerList(
                watchlist
                    .group(group)
                    .with_context(|| format!("no group '{group}' in {}", path.display()))?
                    .to_vec(),
            )
            .tickers()?,
            None => watchlist.all_tickers(),
        }
    } else if let Some(dir) = &source.data_dir {
        DirectoryTickers::new(dir)
            .tickers()
            .with_context(|| format!("failed to list tickers in {}", dir.display()))?
    } else {
        bail!("no tickers: pass --tickers, --watchlist or --data-dir");
    };

    if tickers.is_empty() {
        bail!("ticker list is empty");
    }

    Ok(Inputs {
        pipeline,
        provider,
        tickers,
    })
}

fn parse_date_arg(arg: Option<&str>) -> Result<Option<NaiveDate>> {
    arg.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
    })
    .transpose()
}

fn run_cmd(source: &Source, output_dir: &Path) -> Result<()> {
    let inputs = resolve(source)?;
    let report = inputs
        .pipeline
        .run_batch(inputs.provider.as_ref(), &inputs.tickers);

    let dir = save_artifacts(&report, output_dir)?;
    LogSink::default()
        .deliver(&report, &dir)
        .context("report delivery failed")?;

    print_summary(&report);
    println!("Artifacts saved to: {}", dir.display());
    Ok(())
}

fn screen_cmd(source: &Source, output: &Path) -> Result<()> {
    let inputs = resolve(source)?;
    let report = inputs
        .pipeline
        .screen_batch(inputs.provider.as_ref(), &inputs.tickers);

    write_file(output, &export_screen_csv(&report.passed)?)?;
    println!(
        "Screened {} ticker(s): {} passed, {} rejected",
        inputs.tickers.len(),
        report.passed.len(),
        report.rejected.len()
    );
    println!("Screen saved to: {}", output.display());
    Ok(())
}

fn dataset_cmd(source: &Source, output: &Path) -> Result<()> {
    let inputs = resolve(source)?;
    let report = inputs
        .pipeline
        .run_batch(inputs.provider.as_ref(), &inputs.tickers);

    let rows = build_dataset(&report, inputs.pipeline.rule());
    let horizons = &inputs.pipeline.config().dataset.horizons;
    write_file(output, &export_dataset_csv(&rows, horizons)?)?;
    info!(rows = rows.len(), path = %output.display(), "dataset written");

    println!(
        "{} of {} ticker(s) succeeded, {} training rows",
        report.succeeded(),
        report.attempted(),
        rows.len()
    );
    println!("Dataset saved to: {}", output.display());
    Ok(())
}

fn init_config_cmd(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", output.display());
    }
    let toml = PipelineConfig::default().to_toml()?;
    write_file(output, &toml)?;
    println!("Default configuration written to: {}", output.display());
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("=== Batch Result ===");
    println!(
        "Tickers:        {} of {} succeeded",
        report.succeeded(),
        report.attempted()
    );
    println!("Signals:        {}", report.signal_count());
    println!("Data hash:      {}", report.data_hash);

    if !report.results.is_empty() {
        println!();
        println!(
            "{:<8} {:>8} {:>12} {:>10} {:>8}",
            "Ticker", "Signals", "Total Ret", "Win Rate", "Sharpe"
        );
        println!("{}", "-".repeat(50));
        for r in &report.results {
            let s = &r.backtest.summary;
            println!(
                "{:<8} {:>8} {:>11.2}% {:>9.1}% {:>8.3}",
                r.ticker,
                r.signals.len(),
                s.total_return * 100.0,
                s.win_rate * 100.0,
                s.sharpe_ratio
            );
        }
    }

    for skip in &report.skipped {
        println!("SKIPPED {}: {}", skip.ticker, skip.reason);
    }
    if report.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
