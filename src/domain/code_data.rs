//! Per-symbol working set: the price series plus everything precomputed once
//! before the day loop.

use std::collections::{BTreeMap, HashMap};

use crate::domain::extrema::{find_maxima, find_minima};
use crate::domain::flag::FlagConfig;
use crate::domain::indicator::{compute_indicators, sma, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::regression::Point;

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub series: PriceSeries,
    /// Maxima of highs.
    pub maxima: BTreeMap<usize, Point>,
    /// Minima of lows.
    pub minima: BTreeMap<usize, Point>,
    /// SMA(close, trend_filter_period); zeros when the filter is off.
    pub trend_sma: Vec<f64>,
    pub indicators: HashMap<IndicatorType, IndicatorSeries>,
}

impl SymbolData {
    pub fn new(series: PriceSeries, flag: &FlagConfig, indicators: &[IndicatorType]) -> Self {
        let maxima = find_maxima(&series.highs(), flag.look_back, flag.look_forward);
        let minima = find_minima(&series.lows(), flag.look_back, flag.look_forward);
        let trend_sma = sma(&series.closes(), flag.trend_filter_period);
        let indicators = compute_indicators(&series, indicators);

        Self {
            series,
            maxima,
            minima,
            trend_sma,
            indicators,
        }
    }

    pub fn code(&self) -> &str {
        self.series.code()
    }

    pub fn bar_count(&self) -> usize {
        self.series.len()
    }

    /// Latest value of an indicator, if it was computed and has warmed up.
    pub fn latest(&self, indicator: IndicatorType) -> Option<f64> {
        let series = self.indicators.get(&indicator)?;
        let last = self.bar_count().checked_sub(1)?;
        if last < series.begin_index() {
            return None;
        }
        series.primary().get(last).copied()
    }
}
