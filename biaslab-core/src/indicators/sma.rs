//! Simple rolling mean.
//!
//! Mean over a trailing window of `window` values.
//! Lookback: window - 1 (first valid value at index window-1).
//!
//! Each window is summed directly rather than by add/remove updates, so a
//! window of exact zeros yields an exact zero. RSI relies on that to detect a
//! zero average loss.

use super::Series;

/// Rolling mean of `values` over `window` positions.
pub fn rolling_mean(values: &[f64], window: usize) -> Series {
    let n = values.len();
    if window == 0 {
        return vec![None; n];
    }
    (0..n)
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            Some(sum / window as f64)
        })
        .collect()
}
