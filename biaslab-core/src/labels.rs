//! Forward-return labels for supervised datasets.

use crate::domain::PriceBar;

/// Fractional return from each bar's close to the close `h` bars later,
/// one inner vector per bar with one entry per horizon. Entries past the end
/// of the series are `None`.
pub fn forward_returns(bars: &[PriceBar], horizons: &[usize]) -> Vec<Vec<Option<f64>>> {
    (0..bars.len())
        .map(|t| {
            horizons
                .iter()
                .map(|&h| {
                    let base = bars[t].close;
                    bars.get(t + h)
                        .filter(|_| base != 0.0)
                        .map(|later| later.close / base - 1.0)
                })
                .collect()
        })
        .collect()
}

/// True when any defined horizon return strictly exceeds `threshold`.
pub fn label(returns: &[Option<f64>], threshold: f64) -> bool {
    returns.iter().flatten().any(|&r| r > threshold)
}
