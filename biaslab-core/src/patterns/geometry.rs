//! Chart-shape heuristics over closing prices.

use crate::domain::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryTagger {
    /// Minimum index spacing between peaks (and between troughs).
    pub peak_distance: usize,
    /// Max shoulder mismatch as a fraction of the head.
    pub shoulder_tolerance: f64,
    /// Max trough mismatch as a fraction of the first trough.
    pub bottom_tolerance: f64,
    /// Bars in the flag fit.
    pub flag_window: usize,
    /// Max absolute slope (price per bar) of the flag fit.
    pub flag_slope_max: f64,
}

impl Default for GeometryTagger {
    fn default() -> Self {
        Self {
            peak_distance: 2,
            shoulder_tolerance: 0.05,
            bottom_tolerance: 0.03,
            flag_window: 10,
            flag_slope_max: 0.05,
        }
    }
}

impl GeometryTagger {
    /// Names of every shape found, in a fixed order.
    pub fn matches(&self, bars: &[PriceBar]) -> Vec<&'static str> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut found = Vec::new();
        if self.head_and_shoulders(&closes) {
            found.push("Head & Shoulders");
        }
        if self.double_bottom(&closes) {
            found.push("Double Bottom");
        }
        if cup_and_handle(&closes) {
            found.push("Cup & Handle");
        }
        if self.bull_flag(&closes) {
            found.push("Bull Flag");
        }
        found
    }

    fn head_and_shoulders(&self, closes: &[f64]) -> bool {
        let peaks = find_peaks(closes, self.peak_distance);
        peaks.windows(3).any(|w| {
            let (left, head, right) = (closes[w[0]], closes[w[1]], closes[w[2]]);
            left < head && head > right && (left - right).abs() < self.shoulder_tolerance * head
        })
    }

    fn double_bottom(&self, closes: &[f64]) -> bool {
        let inverted: Vec<f64> = closes.iter().map(|c| -c).collect();
        let troughs = find_peaks(&inverted, self.peak_distance);
        troughs.windows(2).any(|w| {
            let (a, b) = (closes[w[0]], closes[w[1]]);
            (a - b).abs() < self.bottom_tolerance * a
        })
    }

    fn bull_flag(&self, closes: &[f64]) -> bool {
        if self.flag_window < 2 || closes.len() < self.flag_window {
            return false;
        }
        let tail = &closes[closes.len() - self.flag_window..];
        linear_slope(tail).abs() < self.flag_slope_max
    }
}

/// Global minimum in the middle of the window with both sides averaging
/// above it.
fn cup_and_handle(closes: &[f64]) -> bool {
    let n = closes.len() as f64;
    let Some(min_idx) = argmin(closes) else {
        return false;
    };
    let idx = min_idx as f64;
    if !(0.3 * n < idx && idx < 0.7 * n) {
        return false;
    }
    let bottom = closes[min_idx];
    mean(&closes[..min_idx]) > bottom && mean(&closes[min_idx..]) > bottom
}

/// Local maxima, with flat tops reported at their midpoint. Peaks closer
/// than `distance` are thinned, keeping the taller one.
pub fn find_peaks(values: &[f64], distance: usize) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    if distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    let mut by_height = peaks.clone();
    by_height.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(b.cmp(&a)));
    let mut kept: Vec<usize> = Vec::with_capacity(peaks.len());
    for p in by_height {
        if kept.iter().all(|&k| k.abs_diff(p) >= distance) {
            kept.push(p);
        }
    }
    kept.sort_unstable();
    kept
}

/// Least-squares slope of `values` against 0, 1, 2, ...
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    num / den
}

fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
