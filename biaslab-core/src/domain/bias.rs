//! Directional stance inferred for a bar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading bias for one indicator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Long,
    Short,
    Neutral,
}

impl Bias {
    /// Signed position taken on this bias: Long → +1, Short → −1, Neutral → 0.
    pub fn position(self) -> i8 {
        match self {
            Bias::Long => 1,
            Bias::Short => -1,
            Bias::Neutral => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bias::Long => "Long",
            Bias::Short => "Short",
            Bias::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position for a possibly-undefined bias. Undefined is flat.
pub fn position_of(bias: Option<Bias>) -> i8 {
    bias.map_or(0, Bias::position)
}
