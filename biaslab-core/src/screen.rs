//! Single-day screen over a ticker's recent history.
//!
//! Metrics are read off the latest bar. A ticker passes when its price sits
//! inside the configured band, its volume clears the floor and its ATR clears
//! the minimum.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;
use crate::indicators::{Atr, Indicator, Rsi};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriteria {
    pub min_price: f64,
    pub max_price: f64,
    pub min_volume: f64,
    pub min_atr: f64,
    pub atr_period: usize,
    pub rsi_period: usize,
    /// Fewer bars than this are rejected outright.
    pub min_history: usize,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_price: 1.0,
            max_price: 30.0,
            min_volume: 100_000.0,
            min_atr: 0.1,
            atr_period: 14,
            rsi_period: 14,
            min_history: 14,
        }
    }
}

/// Latest-bar metrics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub ticker: String,
    pub date: NaiveDate,
    pub price: f64,
    pub volume: f64,
    pub atr: Option<f64>,
    pub price_action_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub vwap_deviation_pct: Option<f64>,
    pub gap_pct: Option<f64>,
    pub volume_surge_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("only {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },
    #[error("price {price} outside [{min}, {max}]")]
    PriceOutOfRange { price: f64, min: f64, max: f64 },
    #[error("volume {volume} below {min}")]
    LowVolume { volume: f64, min: f64 },
    #[error("ATR {atr:?} below {min}")]
    LowAtr { atr: Option<f64>, min: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScreenOutcome {
    Passed(ScreenSnapshot),
    Rejected { ticker: String, reason: RejectReason },
}

impl ScreenOutcome {
    pub fn passed(&self) -> Option<&ScreenSnapshot> {
        match self {
            ScreenOutcome::Passed(snapshot) => Some(snapshot),
            ScreenOutcome::Rejected { .. } => None,
        }
    }
}

/// Screen `bars` (date-ascending) against `criteria`.
pub fn screen(ticker: &str, bars: &[PriceBar], criteria: &ScreenCriteria) -> ScreenOutcome {
    let need = criteria.min_history.max(1);
    if bars.len() < need {
        return ScreenOutcome::Rejected {
            ticker: ticker.to_string(),
            reason: RejectReason::InsufficientHistory {
                have: bars.len(),
                need,
            },
        };
    }

    let snapshot = snapshot(ticker, bars, criteria);
    let reason = if snapshot.price < criteria.min_price || snapshot.price > criteria.max_price {
        Some(RejectReason::PriceOutOfRange {
            price: snapshot.price,
            min: criteria.min_price,
            max: criteria.max_price,
        })
    } else if snapshot.volume < criteria.min_volume {
        Some(RejectReason::LowVolume {
            volume: snapshot.volume,
            min: criteria.min_volume,
        })
    } else if !snapshot.atr.is_some_and(|atr| atr >= criteria.min_atr) {
        Some(RejectReason::LowAtr {
            atr: snapshot.atr,
            min: criteria.min_atr,
        })
    } else {
        None
    };

    match reason {
        None => ScreenOutcome::Passed(snapshot),
        Some(reason) => ScreenOutcome::Rejected {
            ticker: ticker.to_string(),
            reason,
        },
    }
}

/// Latest-bar metrics. `bars` must be non-empty.
fn snapshot(ticker: &str, bars: &[PriceBar], criteria: &ScreenCriteria) -> ScreenSnapshot {
    let last = bars.len() - 1;
    let today = &bars[last];

    let pct_of_open = |value: f64| (today.open != 0.0).then(|| value / today.open * 100.0);

    let atr = Atr::new(criteria.atr_period.max(1))
        .compute(bars)
        .pop()
        .flatten();
    let rsi = Rsi::new(criteria.rsi_period.max(1))
        .compute(bars)
        .pop()
        .flatten();

    let (pv, vol) = bars
        .iter()
        .fold((0.0, 0.0), |(pv, v), b| (pv + b.close * b.volume, v + b.volume));
    let vwap_deviation_pct = (vol > 0.0)
        .then(|| pv / vol)
        .filter(|vwap| *vwap != 0.0)
        .map(|vwap| (today.close - vwap) / vwap * 100.0);

    let gap_pct = last
        .checked_sub(1)
        .map(|p| bars[p].close)
        .filter(|prev| *prev != 0.0)
        .map(|prev| (today.open - prev) / prev * 100.0);

    let mean_volume = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;
    let volume_surge_pct = (mean_volume > 0.0).then(|| today.volume / mean_volume * 100.0);

    ScreenSnapshot {
        ticker: ticker.to_string(),
        date: today.date,
        price: today.close,
        volume: today.volume,
        atr,
        price_action_pct: pct_of_open(today.close - today.open),
        volatility_pct: pct_of_open(today.high - today.low),
        rsi,
        vwap_deviation_pct,
        gap_pct,
        volume_surge_pct,
    }
}
