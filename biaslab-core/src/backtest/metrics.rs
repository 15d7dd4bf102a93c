//! Summary statistics: pure functions over a strategy return series.

/// Win rate: fraction of strictly positive returns. Zero-filled rows count
/// in the denominator. Empty input → 0.0.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / returns.len() as f64
}

/// Total return read from the second-to-last equity value.
///
/// The final row's forward return is always unknown and zero-filled, so the
/// curve is read one row early. Fewer than two rows → 0.0.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match equity_curve.len() {
        0 | 1 => 0.0,
        n => equity_curve[n - 2] - 1.0,
    }
}

/// Annualized Sharpe ratio: mean / sample stdev * sqrt(trading_days).
///
/// Returns 0.0 if fewer than 2 returns or the stdev is zero.
pub fn sharpe_ratio(returns: &[f64], trading_days: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    mean_f64(returns) / std * trading_days.sqrt()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
