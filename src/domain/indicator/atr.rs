//! Average range.
//!
//! Rolling mean of the same-day `high - low` range. Unlike the textbook ATR this
//! ignores gaps from the previous close; flag thresholds are tuned against it.

use super::sma::sma;

pub fn average_true_range(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    let ranges: Vec<f64> = high.iter().zip(low).map(|(h, l)| h - l).collect();
    sma(&ranges, period)
}
