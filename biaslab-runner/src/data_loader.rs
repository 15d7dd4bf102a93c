//! Bar loading for the runner: per-ticker CSV files and synthetic data.
//!
//! CSV ingestion is lenient about layout and strict about values:
//! - column names are trimmed, lower-cased and spaces become `_`
//! - `t` and `price` headers are read as `date`
//! - rows with an unparseable date or OHLCV cell are dropped
//! - rows are sorted by date and de-duplicated on date (first wins)
//!
//! Synthetic data is a developer-only mode. Its bars are a deterministic
//! random walk seeded from the ticker name.

use std::io::Read;
use std::path::Path;

use biaslab_core::domain::PriceBar;
use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::debug;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: String, column: &'static str },
}

const REQUIRED: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Normalize a header cell: trimmed, lower-case, spaces to underscores,
/// with `t` and `price` aliased to `date`.
pub fn normalize_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase().replace(' ', "_");
    match normalized.as_str() {
        "t" | "price" => "date".to_string(),
        _ => normalized,
    }
}

/// `YYYY-MM-DD`, optionally followed by a time component.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    let day = cell.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load `path` as the bar history for `ticker`.
pub fn load_csv(path: &Path, ticker: &str) -> Result<Vec<PriceBar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_csv(file, ticker, &path.display().to_string())
}

/// Parse CSV bar data from any reader. `source` names the input in errors.
pub fn parse_csv<R: Read>(
    reader: R,
    ticker: &str,
    source: &str,
) -> Result<Vec<PriceBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| LoadError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .iter()
        .map(normalize_column)
        .collect();

    let mut idx = [0usize; 6];
    for (slot, column) in idx.iter_mut().zip(REQUIRED) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: source.to_string(),
                column,
            })?;
    }
    let [date_i, open_i, high_i, low_i, close_i, volume_i] = idx;

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
        let Ok(record) = record else {
            dropped += 1;
            continue;
        };
        let cell = |i: usize| record.get(i).unwrap_or("");
        let parsed = (|| {
            Some(PriceBar {
                ticker: ticker.to_string(),
                date: parse_date(cell(date_i))?,
                open: parse_number(cell(open_i))?,
                high: parse_number(cell(high_i))?,
                low: parse_number(cell(low_i))?,
                close: parse_number(cell(close_i))?,
                volume: parse_number(cell(volume_i))?,
            })
        })();
        match parsed {
            Some(bar) if bar.validate().is_ok() => bars.push(bar),
            _ => dropped += 1,
        }
    }

    bars.sort_by_key(|b| b.date);
    let before = bars.len();
    bars.dedup_by_key(|b| b.date);
    let duplicates = before - bars.len();

    if dropped > 0 || duplicates > 0 {
        debug!(ticker, source, dropped, duplicates, "cleaned CSV rows");
    }
    Ok(bars)
}

/// Deterministic BLAKE3 hash over every ticker's bars, in ticker order.
pub fn dataset_hash<'a>(series: impl IntoIterator<Item = (&'a str, &'a [PriceBar])>) -> String {
    let mut series: Vec<_> = series.into_iter().collect();
    series.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = blake3::Hasher::new();
    for (ticker, bars) in series {
        hasher.update(ticker.as_bytes());
        for bar in bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Random-walk weekday bars from `start` through `end`, seeded from the
/// ticker so repeated runs agree.
pub fn synthetic_bars(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = rng.gen_range(5.0..50.0_f64);
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.04..0.04);
        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.03));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.03));
        let volume = rng.gen_range(50_000.0..2_000_000.0_f64).round();

        bars.push(PriceBar {
            ticker: ticker.to_string(),
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column("  Adj Close "), "adj_close");
        assert_eq!(normalize_column("T"), "date");
        assert_eq!(normalize_column("Price"), "date");
        assert_eq!(normalize_column("Volume"), "volume");
    }

    #[test]
    fn parses_dates_with_optional_time() {
        assert_eq!(parse_date("2024-03-01"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01 00:00:00-05:00"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01T09:30:00Z"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("03/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn standard_layout() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-03,11,12,10,11.5,2000\n\
                   2024-01-02,10,11,9,10.5,1000\n";
        let bars = parse_csv(csv.as_bytes(), "ACME", "test").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].volume, 2000.0);
        assert!(bars.iter().all(|b| b.ticker == "ACME"));
    }

    #[test]
    fn multi_header_layout_drops_junk_rows() {
        let csv = "Price,Close,High,Low,Open,Volume\n\
                   Ticker,ACME,ACME,ACME,ACME,ACME\n\
                   Date,,,,,\n\
                   2024-01-02,10.5,11,9,10,1000\n";
        let bars = parse_csv(csv.as_bytes(), "ACME", "test").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].close, 10.5);
    }

    #[test]
    fn t_column_and_bad_cells() {
        let csv = "t,open,high,low,close,volume\n\
                   2024-01-02,10,11,9,10.5,1000\n\
                   2024-01-03,abc,11,9,10.5,1000\n\
                   2024-01-04,10,11,9,,1000\n\
                   2024-01-02,99,99,99,99,99\n";
        let bars = parse_csv(csv.as_bytes(), "ACME", "test").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 10.5);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "date,open,high,low,close\n2024-01-02,10,11,9,10.5\n";
        let err = parse_csv(csv.as_bytes(), "ACME", "test").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                column: "volume",
                ..
            }
        ));
    }

    #[test]
    fn synthetic_is_deterministic_and_weekday_only() {
        let a = synthetic_bars("ACME", d(2024, 1, 1), d(2024, 3, 31));
        let b = synthetic_bars("ACME", d(2024, 1, 1), d(2024, 3, 31));
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.iter().all(|bar| bar.validate().is_ok()));
        assert!(a
            .iter()
            .all(|bar| bar.date.weekday().number_from_monday() <= 5));
        assert_ne!(a, synthetic_bars("OTHER", d(2024, 1, 1), d(2024, 3, 31)));
    }

    #[test]
    fn dataset_hash_ignores_input_order() {
        let a = synthetic_bars("AAA", d(2024, 1, 1), d(2024, 1, 31));
        let b = synthetic_bars("BBB", d(2024, 1, 1), d(2024, 1, 31));
        let h1 = dataset_hash([("AAA", a.as_slice()), ("BBB", b.as_slice())]);
        let h2 = dataset_hash([("BBB", b.as_slice()), ("AAA", a.as_slice())]);
        assert_eq!(h1, h2);
        assert_ne!(h1, dataset_hash([("AAA", a.as_slice())]));
    }
}
