//! Candlestick detectors evaluated on the latest bar.
//!
//! Each detector returns a signed strength: +100 bullish, -100 bearish,
//! 0 when the pattern is absent. Thresholds are body/shadow ratios of the
//! bar's own range, with the prior trend read from recent closes.

use crate::domain::PriceBar;

/// A detector over the full history; looks at the tail only.
pub type Detector = fn(&[PriceBar]) -> i32;

/// Body at or below this share of the range is a doji.
pub const DOJI_RATIO: f64 = 0.1;
/// Body at or below this share of the range is short.
pub const BODY_SHORT_RATIO: f64 = 0.3;
/// Body at or above this share of the range is long.
pub const BODY_LONG_RATIO: f64 = 0.6;
/// Shadow at or below this share of the range is very short.
pub const SHADOW_VERYSHORT_RATIO: f64 = 0.1;
/// Bars of prior closes used to judge trend.
pub const TREND_LOOKBACK: usize = 5;

/// Ordered detector registry.
pub static REGISTRY: &[(&str, Detector)] = &[
    ("Hammer", hammer),
    ("Engulfing", engulfing),
    ("MorningStar", morning_star),
    ("Piercing", piercing),
    ("ShootingStar", shooting_star),
    ("Doji", doji),
    ("HangingMan", hanging_man),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CandlestickTagger;

impl CandlestickTagger {
    /// Names of every registry detector firing on the latest bar.
    pub fn matches(&self, bars: &[PriceBar]) -> Vec<&'static str> {
        REGISTRY
            .iter()
            .filter(|(_, detect)| detect(bars) != 0)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Signed strength per registry entry, in registry order.
    pub fn scores(&self, bars: &[PriceBar]) -> Vec<(&'static str, i32)> {
        REGISTRY
            .iter()
            .map(|(name, detect)| (*name, detect(bars)))
            .collect()
    }
}

fn body(bar: &PriceBar) -> f64 {
    (bar.close - bar.open).abs()
}

fn range(bar: &PriceBar) -> f64 {
    bar.high - bar.low
}

fn upper_shadow(bar: &PriceBar) -> f64 {
    bar.high - bar.open.max(bar.close)
}

fn lower_shadow(bar: &PriceBar) -> f64 {
    bar.open.min(bar.close) - bar.low
}

fn is_bullish(bar: &PriceBar) -> bool {
    bar.close > bar.open
}

fn is_bearish(bar: &PriceBar) -> bool {
    bar.close < bar.open
}

fn body_mid(bar: &PriceBar) -> f64 {
    (bar.open + bar.close) / 2.0
}

fn is_long_body(bar: &PriceBar) -> bool {
    let r = range(bar);
    r > 0.0 && body(bar) / r >= BODY_LONG_RATIO
}

fn is_short_body(bar: &PriceBar) -> bool {
    let r = range(bar);
    r > 0.0 && body(bar) / r <= BODY_SHORT_RATIO
}

/// Sign of the move into `bars[end]` from `TREND_LOOKBACK` bars earlier.
/// Positive for an uptrend, negative for a downtrend, zero when flat or
/// when history is too short.
fn trend_into(bars: &[PriceBar], end: usize) -> f64 {
    if end < TREND_LOOKBACK {
        return 0.0;
    }
    let delta = bars[end].close - bars[end - TREND_LOOKBACK].close;
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Small body near the top of the range with a long lower shadow.
fn hammer_shape(bar: &PriceBar) -> bool {
    let b = body(bar);
    let r = range(bar);
    r > 0.0
        && b / r <= BODY_SHORT_RATIO
        && lower_shadow(bar) >= 2.0 * b
        && lower_shadow(bar) > 0.0
        && upper_shadow(bar) / r <= SHADOW_VERYSHORT_RATIO
}

/// Small body near the bottom of the range with a long upper shadow.
fn star_shape(bar: &PriceBar) -> bool {
    let b = body(bar);
    let r = range(bar);
    r > 0.0
        && b / r <= BODY_SHORT_RATIO
        && upper_shadow(bar) >= 2.0 * b
        && upper_shadow(bar) > 0.0
        && lower_shadow(bar) / r <= SHADOW_VERYSHORT_RATIO
}

/// Hammer shape after a decline.
pub fn hammer(bars: &[PriceBar]) -> i32 {
    let Some(last) = bars.len().checked_sub(1) else {
        return 0;
    };
    if hammer_shape(&bars[last]) && last > 0 && trend_into(bars, last - 1) < 0.0 {
        100
    } else {
        0
    }
}

/// Hammer shape after an advance.
pub fn hanging_man(bars: &[PriceBar]) -> i32 {
    let Some(last) = bars.len().checked_sub(1) else {
        return 0;
    };
    if hammer_shape(&bars[last]) && last > 0 && trend_into(bars, last - 1) > 0.0 {
        -100
    } else {
        0
    }
}

/// Inverted hammer shape after an advance.
pub fn shooting_star(bars: &[PriceBar]) -> i32 {
    let Some(last) = bars.len().checked_sub(1) else {
        return 0;
    };
    if star_shape(&bars[last]) && last > 0 && trend_into(bars, last - 1) > 0.0 {
        -100
    } else {
        0
    }
}

/// Open and close nearly equal relative to the range.
pub fn doji(bars: &[PriceBar]) -> i32 {
    match bars.last() {
        Some(bar) if range(bar) > 0.0 && body(bar) / range(bar) <= DOJI_RATIO => 100,
        _ => 0,
    }
}

/// Latest body fully engulfs the opposite-colored prior body.
pub fn engulfing(bars: &[PriceBar]) -> i32 {
    let [.., prev, cur] = bars else {
        return 0;
    };
    if body(cur) <= body(prev) {
        return 0;
    }
    if is_bearish(prev) && is_bullish(cur) && cur.open <= prev.close && cur.close >= prev.open {
        return 100;
    }
    if is_bullish(prev) && is_bearish(cur) && cur.open >= prev.close && cur.close <= prev.open {
        return -100;
    }
    0
}

/// Bullish bar opening below a long bearish bar's low and closing above its
/// body midpoint, still inside its body.
pub fn piercing(bars: &[PriceBar]) -> i32 {
    let [.., prev, cur] = bars else {
        return 0;
    };
    let hit = is_bearish(prev)
        && is_long_body(prev)
        && is_bullish(cur)
        && cur.open < prev.low
        && cur.close > body_mid(prev)
        && cur.close < prev.open;
    if hit {
        100
    } else {
        0
    }
}

/// Long bearish bar, short body gapping below it, then a bullish bar closing
/// above the first body's midpoint.
pub fn morning_star(bars: &[PriceBar]) -> i32 {
    let [.., first, star, third] = bars else {
        return 0;
    };
    let hit = is_bearish(first)
        && is_long_body(first)
        && is_short_body(star)
        && star.open.max(star.close) < first.close
        && is_bullish(third)
        && third.close > body_mid(first);
    if hit {
        100
    } else {
        0
    }
}
