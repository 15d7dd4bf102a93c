//! Domain types for biaslab

pub mod bar;
pub mod bias;
pub mod rows;

pub use bar::{is_sorted_by_date, BarError, PriceBar};
pub use bias::{position_of, Bias};
pub use rows::{IndicatorRow, SignalRow};
