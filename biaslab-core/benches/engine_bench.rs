//! Criterion benchmarks for BiasLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator engine (full IndicatorRow series)
//! 2. Single indicators (EMA, RSI, ATR, VWAP)
//! 3. Classify + filter over computed rows
//! 4. Backtest accountant over signal rows

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use biaslab_core::backtest::{self, BacktestConfig};
use biaslab_core::classifier::ThresholdRule;
use biaslab_core::domain::PriceBar;
use biaslab_core::filter::{FilterConfig, SignalFilter};
use biaslab_core::indicators::{Atr, Ema, Indicator, IndicatorEngine, Rsi, Vwap, VwapPolicy};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            PriceBar {
                ticker: "BENCH".into(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500) as f64 * 1_000.0,
            }
        })
        .collect()
}

// ── 1. Indicator Engine ──────────────────────────────────────────────

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_engine");
    let engine = IndicatorEngine::default();

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::new("compute", bar_count), &bars, |b, bars| {
            b.iter(|| engine.compute(black_box(bars)))
        });
    }

    group.finish();
}

// ── 2. Single Indicators ─────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let bars = make_bars(2520);

    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Ema::new(20)),
        Box::new(Rsi::new(14)),
        Box::new(Atr::new(14)),
        Box::new(Vwap::new(VwapPolicy::Session)),
    ];
    for ind in &indicators {
        group.bench_function(ind.name().to_string(), |b| {
            b.iter(|| ind.compute(black_box(&bars)))
        });
    }

    group.finish();
}

// ── 3. Classify + Filter ─────────────────────────────────────────────

fn bench_select(c: &mut Criterion) {
    let rows = IndicatorEngine::default().compute(&make_bars(2520));
    let rule = ThresholdRule::default();
    let filter = SignalFilter::new(FilterConfig {
        volume_surge_min: 0.0,
        volatility_min: 0.0,
    });

    c.bench_function("select_2520", |b| {
        b.iter(|| filter.select(black_box(&rows), &rule))
    });
}

// ── 4. Accountant ────────────────────────────────────────────────────

fn bench_accountant(c: &mut Criterion) {
    let rows = IndicatorEngine::default().compute(&make_bars(2520));
    let signals = SignalFilter::new(FilterConfig {
        volume_surge_min: 0.0,
        volatility_min: 0.0,
    })
    .select(&rows, &ThresholdRule::default());
    let config = BacktestConfig::default();

    c.bench_function("backtest_signals_2520", |b| {
        b.iter(|| backtest::backtest_signals("BENCH", black_box(&signals), &config))
    });
}

criterion_group!(
    benches,
    bench_engine,
    bench_indicators,
    bench_select,
    bench_accountant,
);
criterion_main!(benches);
