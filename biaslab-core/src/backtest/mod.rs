//! Backtest accountant: bias series in, equity curve and statistics out.
//!
//! One position per row, held for one period:
//! - next_close(t) = close(t+1), undefined on the last row
//! - market_return(t) = next_close(t) / close(t) - 1
//! - strategy_return(t) = position(t) * market_return(t), zero-filled when
//!   the market return is undefined (scored flat, not dropped)
//! - equity_curve(t) = prod_{i<=t} (1 + strategy_return(i))
//!
//! Each ticker is accounted independently; there is no cross-ticker state.

pub mod metrics;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{position_of, Bias, IndicatorRow, SignalRow};

/// Which rows the accountant walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestMode {
    /// Only the filtered signal rows; next_close is the next signal's close.
    #[default]
    Signals,
    /// Every indicator row with bias joined by date; unselected rows carry no
    /// bias and stay flat.
    FullSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Annualization factor for the Sharpe ratio.
    pub trading_days: f64,
    pub mode: BacktestMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            trading_days: 252.0,
            mode: BacktestMode::Signals,
        }
    }
}

/// A SignalRow with its forward return and running equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub row: IndicatorRow,
    /// `None` for rows the filter never selected (full-series mode).
    pub bias: Option<Bias>,
    pub next_close: Option<f64>,
    pub market_return: Option<f64>,
    pub position: i8,
    pub strategy_return: f64,
    pub equity_curve: f64,
}

/// Per-ticker performance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub ticker: String,
    pub total_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub rows: usize,
}

/// Complete accounting output for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub rows: Vec<BacktestRow>,
    pub summary: SummaryStats,
}

/// Account according to `config.mode`.
///
/// `rows` is the ticker's full indicator series, `signals` the filter output.
pub fn run(
    ticker: &str,
    rows: &[IndicatorRow],
    signals: &[SignalRow],
    config: &BacktestConfig,
) -> Backtest {
    match config.mode {
        BacktestMode::Signals => backtest_signals(ticker, signals, config),
        BacktestMode::FullSeries => backtest_full_series(ticker, rows, signals, config),
    }
}

/// Account the filtered signal rows only.
pub fn backtest_signals(ticker: &str, signals: &[SignalRow], config: &BacktestConfig) -> Backtest {
    let entries = signals
        .iter()
        .map(|s| (s.row.clone(), Some(s.bias)))
        .collect();
    account(ticker, entries, config)
}

/// Account every row, with signal bias joined on date.
pub fn backtest_full_series(
    ticker: &str,
    rows: &[IndicatorRow],
    signals: &[SignalRow],
    config: &BacktestConfig,
) -> Backtest {
    let by_date: HashMap<_, Bias> = signals.iter().map(|s| (s.row.bar.date, s.bias)).collect();
    let entries = rows
        .iter()
        .map(|r| (r.clone(), by_date.get(&r.bar.date).copied()))
        .collect();
    account(ticker, entries, config)
}

fn account(
    ticker: &str,
    mut entries: Vec<(IndicatorRow, Option<Bias>)>,
    config: &BacktestConfig,
) -> Backtest {
    entries.sort_by_key(|(row, _)| row.bar.date);

    let next_closes: Vec<Option<f64>> = (0..entries.len())
        .map(|i| entries.get(i + 1).map(|(next, _)| next.bar.close))
        .collect();

    let mut equity = 1.0;
    let rows: Vec<BacktestRow> = entries
        .into_iter()
        .zip(next_closes)
        .map(|((row, bias), next_close)| {
            let close = row.bar.close;
            let market_return = next_close
                .filter(|_| close != 0.0)
                .map(|next| next / close - 1.0);
            let position = position_of(bias);
            let strategy_return = market_return.map_or(0.0, |m| f64::from(position) * m);
            equity *= 1.0 + strategy_return;
            BacktestRow {
                row,
                bias,
                next_close,
                market_return,
                position,
                strategy_return,
                equity_curve: equity,
            }
        })
        .collect();

    let summary = summarize(ticker, &rows, config.trading_days);
    Backtest { rows, summary }
}

/// Summary statistics over an accounted series.
pub fn summarize(ticker: &str, rows: &[BacktestRow], trading_days: f64) -> SummaryStats {
    let returns: Vec<f64> = rows.iter().map(|r| r.strategy_return).collect();
    let equity: Vec<f64> = rows.iter().map(|r| r.equity_curve).collect();
    SummaryStats {
        ticker: ticker.to_string(),
        total_return: metrics::total_return(&equity),
        win_rate: metrics::win_rate(&returns),
        sharpe_ratio: metrics::sharpe_ratio(&returns, trading_days),
        rows: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    fn signal(day: u32, close: f64, bias: Bias) -> SignalRow {
        let bar = PriceBar {
            ticker: "ACME".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        };
        SignalRow {
            row: IndicatorRow::undefined(bar),
            bias,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn long_then_short_accounting() {
        let signals = vec![
            signal(1, 100.0, Bias::Long),
            signal(2, 110.0, Bias::Short),
            signal(3, 99.0, Bias::Neutral),
        ];
        let bt = backtest_signals("ACME", &signals, &BacktestConfig::default());

        assert_eq!(bt.rows[0].next_close, Some(110.0));
        assert!(approx(bt.rows[0].market_return.unwrap(), 0.1));
        assert!(approx(bt.rows[0].strategy_return, 0.1));
        assert!(approx(bt.rows[1].strategy_return, 0.1));
        assert_eq!(bt.rows[2].next_close, None);
        assert_eq!(bt.rows[2].strategy_return, 0.0);
        assert!(approx(bt.rows[1].equity_curve, 1.21));
        assert!(approx(bt.rows[2].equity_curve, 1.21));

        assert!(approx(bt.summary.total_return, 0.21));
        assert!(approx(bt.summary.win_rate, 2.0 / 3.0));
        assert_eq!(bt.summary.rows, 3);
    }

    #[test]
    fn input_is_sorted_by_date() {
        let signals = vec![signal(2, 110.0, Bias::Long), signal(1, 100.0, Bias::Long)];
        let bt = backtest_signals("ACME", &signals, &BacktestConfig::default());
        assert_eq!(bt.rows[0].row.bar.close, 100.0);
        assert_eq!(bt.rows[0].next_close, Some(110.0));
    }

    #[test]
    fn empty_input_gives_empty_rows_and_zero_stats() {
        let bt = backtest_signals("ACME", &[], &BacktestConfig::default());
        assert!(bt.rows.is_empty());
        assert_eq!(bt.summary.ticker, "ACME");
        assert_eq!(bt.summary.total_return, 0.0);
        assert_eq!(bt.summary.win_rate, 0.0);
        assert_eq!(bt.summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn full_series_leaves_unselected_rows_flat() {
        let rows: Vec<IndicatorRow> = [(1, 100.0), (2, 105.0), (3, 110.0)]
            .iter()
            .map(|&(d, c)| signal(d, c, Bias::Neutral).row)
            .collect();
        let signals = vec![signal(2, 105.0, Bias::Long)];
        let config = BacktestConfig {
            mode: BacktestMode::FullSeries,
            ..BacktestConfig::default()
        };
        let bt = run("ACME", &rows, &signals, &config);

        assert_eq!(bt.rows.len(), 3);
        assert_eq!(bt.rows[0].bias, None);
        assert_eq!(bt.rows[0].position, 0);
        assert_eq!(bt.rows[0].strategy_return, 0.0);
        assert_eq!(bt.rows[1].bias, Some(Bias::Long));
        assert!(approx(bt.rows[1].strategy_return, 110.0 / 105.0 - 1.0));
    }

    #[test]
    fn signals_mode_ignores_unselected_rows() {
        let rows: Vec<IndicatorRow> = [(1, 100.0), (2, 105.0), (3, 110.0)]
            .iter()
            .map(|&(d, c)| signal(d, c, Bias::Neutral).row)
            .collect();
        let signals = vec![signal(2, 105.0, Bias::Long)];
        let bt = run("ACME", &rows, &signals, &BacktestConfig::default());
        assert_eq!(bt.rows.len(), 1);
        assert_eq!(bt.rows[0].strategy_return, 0.0);
    }

    #[test]
    fn config_reads_snake_case_mode() {
        let config: BacktestConfig = serde_json::from_str(r#"{"mode": "full_series"}"#).unwrap();
        assert_eq!(config.mode, BacktestMode::FullSeries);
        assert_eq!(config.trading_days, 252.0);
    }
}
