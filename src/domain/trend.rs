//! Trend lines fitted through extrema in a trailing window.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::regression::{Point, Regression};

#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub regression: Regression,
    /// Chronological.
    pub points: Vec<Point>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
}

impl Trend {
    pub fn slope(&self) -> f64 {
        self.regression.slope
    }

    pub fn r_squared(&self) -> f64 {
        self.regression.r_squared
    }

    pub fn value_at(&self, index: usize) -> f64 {
        self.regression.predict(index as f64)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Fit through every extremum in `start_index - window ..= start_index`
/// (clamped at zero). With fewer than two extrema the regression is NaN.
///
/// `start_index` must be a valid index into `bars`.
pub fn fit_trend(
    extrema: &BTreeMap<usize, Point>,
    bars: &[OhlcvBar],
    start_index: usize,
    window: usize,
) -> Trend {
    let first = start_index.saturating_sub(window);
    let points: Vec<Point> = extrema.range(first..=start_index).map(|(_, p)| *p).collect();

    Trend {
        regression: Regression::fit(&points),
        points,
        start_date: bars[first].date,
        end_date: bars[start_index].date,
        start_index: first,
        end_index: start_index,
    }
}
