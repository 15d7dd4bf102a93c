//! Pattern tagging: descriptive labels attached to a ticker's signal rows.
//!
//! Tags never influence bias or accounting. They are resolved once per ticker
//! from the latest bars and copied onto every exported signal row.

pub mod candles;
pub mod geometry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// Label used when no pattern matches.
pub const NO_PATTERN: &str = "None";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaggerError {
    #[error("no bars to tag for {ticker}")]
    NoBars { ticker: String },
}

/// Rule-based candlestick pattern plus chart-geometry pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTags {
    pub rule_pattern: String,
    pub visual_pattern: String,
}

impl Default for PatternTags {
    fn default() -> Self {
        Self {
            rule_pattern: NO_PATTERN.to_string(),
            visual_pattern: NO_PATTERN.to_string(),
        }
    }
}

/// Joins matched pattern names, falling back to [`NO_PATTERN`].
pub(crate) fn join_or_none(names: &[&str]) -> String {
    if names.is_empty() {
        NO_PATTERN.to_string()
    } else {
        names.join(", ")
    }
}

/// Produces pattern tags for one ticker's bar history.
pub trait PatternTagger: Send + Sync {
    fn name(&self) -> &str;
    fn tag(&self, ticker: &str, bars: &[PriceBar]) -> Result<PatternTags, TaggerError>;
}

/// Candlestick registry for the rule pattern, close-price geometry for the
/// visual pattern.
#[derive(Debug, Clone, Default)]
pub struct ChartTagger {
    geometry: geometry::GeometryTagger,
}

impl ChartTagger {
    pub fn new(geometry: geometry::GeometryTagger) -> Self {
        Self { geometry }
    }
}

impl PatternTagger for ChartTagger {
    fn name(&self) -> &str {
        "chart"
    }

    fn tag(&self, ticker: &str, bars: &[PriceBar]) -> Result<PatternTags, TaggerError> {
        if bars.is_empty() {
            return Err(TaggerError::NoBars {
                ticker: ticker.to_string(),
            });
        }
        Ok(PatternTags {
            rule_pattern: join_or_none(&candles::CandlestickTagger.matches(bars)),
            visual_pattern: join_or_none(&self.geometry.matches(bars)),
        })
    }
}

/// Tags everything with the "None" defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTagger;

impl PatternTagger for NullTagger {
    fn name(&self) -> &str {
        "null"
    }

    fn tag(&self, _ticker: &str, _bars: &[PriceBar]) -> Result<PatternTags, TaggerError> {
        Ok(PatternTags::default())
    }
}
