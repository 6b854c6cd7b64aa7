//! Flag pattern detection.
//!
//! A flag is a strong upward run (the pole) followed by a narrow, gently
//! declining consolidation (the top) bounded by two nearly parallel trend
//! lines: resistance through the maxima of highs and support through the
//! minima of lows. A breakout above resistance is projected to continue by
//! the pole's slope over the pole's length.
//!
//! `FlagDetector::detect` evaluates one day independently. Neighbouring days
//! often describe the same consolidation, so `scan` may return several flags
//! for one pattern; the backtest loop reconciles them.

use chrono::NaiveDate;
use log::{debug, trace};

use crate::domain::code_data::SymbolData;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::regression::{Point, Regression};
use crate::domain::trend::{fit_trend, Trend};

/// Detector thresholds. The defaults are hand-tuned and exposed through the
/// `[flag]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagConfig {
    pub look_back: usize,
    pub look_forward: usize,
    pub min_top_len: usize,
    pub max_top_len: usize,
    pub min_pole_len: usize,
    pub max_pole_len: usize,
    pub long_trend_r2: f64,
    pub long_trend_slope: f64,
    pub min_top_points: usize,
    pub min_bottom_points: usize,
    /// Exclusive lower bound for top and bottom slopes.
    pub slope_min: f64,
    /// Exclusive upper bound for top and bottom slopes.
    pub slope_max: f64,
    pub slope_tolerance: f64,
    pub trend_accuracy: f64,
    pub max_retracement: f64,
    pub max_flat_days: usize,
    /// Close must sit above SMA(close, period). 0 disables the filter.
    pub trend_filter_period: usize,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            look_back: 3,
            look_forward: 3,
            min_top_len: 10,
            max_top_len: 20,
            min_pole_len: 10,
            max_pole_len: 40,
            long_trend_r2: 0.8,
            long_trend_slope: 0.0,
            min_top_points: 3,
            min_bottom_points: 2,
            slope_min: -1.0,
            slope_max: 0.0,
            slope_tolerance: 0.03,
            trend_accuracy: 0.8,
            max_retracement: 0.65,
            max_flat_days: 3,
            trend_filter_period: 100,
        }
    }
}

/// Regression over the raw closes of the run preceding the consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagPole {
    pub regression: Regression,
    pub length: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
}

impl FlagPole {
    /// Rise of the regression line across the pole.
    pub fn height(&self) -> f64 {
        self.regression.predict(self.end_index as f64)
            - self.regression.predict(self.start_index as f64)
    }
}

/// The consolidation: resistance (`top`) and support (`bottom`) trends.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagTop {
    pub top: Trend,
    pub bottom: Trend,
    pub length: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
}

/// Straight line through an anchor bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLine {
    pub anchor_index: usize,
    pub anchor_value: f64,
    pub slope: f64,
}

impl PriceLine {
    pub fn value_at(&self, index: usize) -> f64 {
        self.anchor_value + self.slope * (index as f64 - self.anchor_index as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    /// Day the pattern was evaluated on; the last bar of the top.
    pub index: usize,
    pub top: FlagTop,
    pub pole: FlagPole,
    pub target_price: f64,
    pub trigger_price: f64,
    /// Support anchored at `index`, rising at the pole's slope.
    pub price_line: PriceLine,
    pub trigger_date: NaiveDate,
    /// Lowest low from the end of the pole through `index`.
    pub low: f64,
    pub pole_height: f64,
}

impl Flag {
    /// Take-profit level: the flag's low plus a fraction of the pole height.
    pub fn sell_target(&self, retracement: f64) -> f64 {
        self.low + retracement * self.pole_height
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum Rejection {
    #[error("index past the last bar")]
    OutOfRange,
    #[error("no flag top with finite trend fits")]
    NoTop,
    #[error("no pole with a finite fit")]
    NoPole,
    #[error("target {target:.3} not above trigger {trigger:.3}")]
    NoTarget { target: f64, trigger: f64 },
    #[error("top steeper than pole")]
    TopSteeperThanPole,
    #[error("weak pole (r2 {r_squared:.3}, slope {slope:.4})")]
    WeakPole { r_squared: f64, slope: f64 },
    #[error("too few extrema (top {top}, bottom {bottom})")]
    TooFewPoints { top: usize, bottom: usize },
    #[error("slopes out of band (top {top:.4}, bottom {bottom:.4})")]
    SlopeOutOfBand { top: f64, bottom: f64 },
    #[error("trend lines not parallel (top {top:.4}, bottom {bottom:.4})")]
    NotParallel { top: f64, bottom: f64 },
    #[error("inaccurate trend lines (top r2 {top:.3}, bottom r2 {bottom:.3})")]
    InaccurateTop { top: f64, bottom: f64 },
    #[error("retraced {depth:.3} of pole height {height:.3}")]
    Retraced { depth: f64, height: f64 },
    #[error("{0} flat days in pole")]
    FlatDays(usize),
    #[error("close {close:.3} below trend SMA {sma:.3}")]
    BelowTrend { close: f64, sma: f64 },
}

#[derive(Debug, Clone)]
pub struct FlagDetector {
    config: FlagConfig,
}

impl FlagDetector {
    pub fn new(config: FlagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlagConfig {
        &self.config
    }

    /// Bars needed before the longest top and pole both fit.
    pub fn min_history(&self) -> usize {
        self.config.max_top_len + self.config.max_pole_len
    }

    pub fn detect(&self, data: &SymbolData, index: usize) -> Option<Flag> {
        match self.evaluate(data, index) {
            Ok(flag) => {
                debug!(
                    "{}: flag on {} (top {} bars, pole {} bars, trigger {:.3}, target {:.3})",
                    data.series.code(),
                    flag.trigger_date,
                    flag.top.length,
                    flag.pole.length,
                    flag.trigger_price,
                    flag.target_price
                );
                Some(flag)
            }
            Err(rejection) => {
                if let Some(bar) = data.series.bars().get(index) {
                    trace!("{}: no flag at {}: {}", data.series.code(), bar.date, rejection);
                }
                None
            }
        }
    }

    fn evaluate(&self, data: &SymbolData, index: usize) -> Result<Flag, Rejection> {
        let bars = data.series.bars();
        if index >= bars.len() {
            return Err(Rejection::OutOfRange);
        }

        let top = self.best_top(data, index).ok_or(Rejection::NoTop)?;
        let pole = self.best_pole(bars, top.start_index).ok_or(Rejection::NoPole)?;

        let price_line = PriceLine {
            anchor_index: index,
            anchor_value: top.bottom.value_at(index),
            slope: pole.regression.slope,
        };
        let target_price = price_line.value_at(index + pole.length);
        let trigger_price = top.top.value_at(index);

        let low = self.check_gates(data, index, &top, &pole, target_price, trigger_price)?;
        Ok(Flag {
            index,
            trigger_date: bars[index].date,
            pole_height: pole.height(),
            top,
            pole,
            target_price,
            trigger_price,
            price_line,
            low,
        })
    }

    /// Evaluate every day from the last bar back to `floor`. Most recent first.
    pub fn scan(&self, data: &SymbolData, floor: usize) -> Vec<Flag> {
        (floor..data.series.len())
            .rev()
            .filter_map(|i| self.detect(data, i))
            .collect()
    }

    /// The first window with finite fits wins until a longer one improves
    /// both R² strictly.
    fn best_top(&self, data: &SymbolData, index: usize) -> Option<FlagTop> {
        let bars = data.series.bars();
        let mut best: Option<FlagTop> = None;

        for length in self.config.min_top_len..=self.config.max_top_len.min(index) {
            let top = fit_trend(&data.maxima, bars, index, length);
            let bottom = fit_trend(&data.minima, bars, index, length);
            if top.r_squared().is_nan() || bottom.r_squared().is_nan() {
                continue;
            }

            let improves = match &best {
                None => true,
                Some(b) => {
                    top.r_squared() > b.top.r_squared()
                        && bottom.r_squared() > b.bottom.r_squared()
                }
            };
            if improves {
                let start_index = index - length;
                best = Some(FlagTop {
                    top,
                    bottom,
                    length,
                    start_date: bars[start_index].date,
                    end_date: bars[index].date,
                    start_index,
                    end_index: index,
                });
            }
        }

        best
    }

    /// Pole ending at `end`. The first finite fit is taken; longer candidates
    /// must improve both sample count and R² strictly.
    fn best_pole(&self, bars: &[OhlcvBar], end: usize) -> Option<FlagPole> {
        let mut best: Option<FlagPole> = None;

        for length in self.config.min_pole_len..=self.config.max_pole_len {
            let Some(start) = (end + 1).checked_sub(length) else {
                break;
            };
            let points: Vec<Point> = (start..=end)
                .map(|k| Point {
                    x: k as f64,
                    y: bars[k].close,
                })
                .collect();
            let regression = Regression::fit(&points);
            if !regression.is_valid() {
                continue;
            }

            let improves = match &best {
                None => true,
                Some(b) => {
                    regression.n > b.regression.n && regression.r_squared > b.regression.r_squared
                }
            };
            if improves {
                best = Some(FlagPole {
                    regression,
                    length,
                    start_date: bars[start].date,
                    end_date: bars[end].date,
                    start_index: start,
                    end_index: end,
                });
            }
        }

        best
    }

    /// Returns the flag's low when every gate passes.
    fn check_gates(
        &self,
        data: &SymbolData,
        index: usize,
        top: &FlagTop,
        pole: &FlagPole,
        target: f64,
        trigger: f64,
    ) -> Result<f64, Rejection> {
        let c = &self.config;
        let bars = data.series.bars();
        let top_slope = top.top.slope();
        let bottom_slope = top.bottom.slope();
        let pole_slope = pole.regression.slope;

        if !(target > trigger) {
            return Err(Rejection::NoTarget { target, trigger });
        }
        if top_slope.abs() > pole_slope.abs() {
            return Err(Rejection::TopSteeperThanPole);
        }
        if !(pole.regression.r_squared > c.long_trend_r2 && pole_slope > c.long_trend_slope) {
            return Err(Rejection::WeakPole {
                r_squared: pole.regression.r_squared,
                slope: pole_slope,
            });
        }
        if top.top.point_count() < c.min_top_points
            || top.bottom.point_count() < c.min_bottom_points
        {
            return Err(Rejection::TooFewPoints {
                top: top.top.point_count(),
                bottom: top.bottom.point_count(),
            });
        }
        let in_band = |s: f64| c.slope_min < s && s < c.slope_max;
        if !in_band(top_slope) || !in_band(bottom_slope) {
            return Err(Rejection::SlopeOutOfBand {
                top: top_slope,
                bottom: bottom_slope,
            });
        }
        if (top_slope - bottom_slope).abs() >= c.slope_tolerance {
            return Err(Rejection::NotParallel {
                top: top_slope,
                bottom: bottom_slope,
            });
        }
        if !(top.top.r_squared() > c.trend_accuracy && top.bottom.r_squared() > c.trend_accuracy) {
            return Err(Rejection::InaccurateTop {
                top: top.top.r_squared(),
                bottom: top.bottom.r_squared(),
            });
        }

        let height = pole.height();
        let pole_top = pole.regression.predict(pole.end_index as f64);
        let low = bars[pole.end_index..=index]
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);
        let depth = pole_top - low;
        if depth > c.max_retracement * height {
            return Err(Rejection::Retraced { depth, height });
        }

        let flat_days = (pole.start_index + 1..=pole.end_index)
            .filter(|&k| bars[k].close == bars[k - 1].close || bars[k].high == bars[k].low)
            .count();
        if flat_days > c.max_flat_days {
            return Err(Rejection::FlatDays(flat_days));
        }

        if c.trend_filter_period > 0 {
            let close = bars[index].close;
            let sma = data.trend_sma[index];
            if !(close > sma) {
                return Err(Rejection::BelowTrend { close, sma });
            }
        }

        Ok(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceSeries;

    /// Flat base, a 30-day rising pole, 16 days drifting down inside a
    /// channel, then a breakout.
    fn flag_bars() -> Vec<OhlcvBar> {
        let mut closes = Vec::new();
        for k in 0..120 {
            closes.push(50.0 + [0.0, 0.3, 0.1, 0.4][k % 4]);
        }
        for k in 0..30 {
            closes.push(50.0 + (k + 1) as f64);
        }
        let wiggle = [0.0, 1.0, 0.0, -1.0];
        for t in 0..16 {
            closes.push(80.0 - 0.1 * (t + 1) as f64 + wiggle[(t + 1) % 4]);
        }
        let last = closes[closes.len() - 1];
        for t in 0..12 {
            closes.push(last + 3.0 * (t + 1) as f64);
        }

        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut prev = closes[0];
        let bars = closes
            .iter()
            .enumerate()
            .map(|(k, &close)| {
                let bar = OhlcvBar {
                    code: "FLAG".into(),
                    date: start + chrono::Duration::days(k as i64),
                    open: prev,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000,
                };
                prev = close;
                bar
            })
            .collect();
        bars
    }

    fn flag_series() -> PriceSeries {
        PriceSeries::new("FLAG", flag_bars()).unwrap()
    }

    fn rejection(bars: Vec<OhlcvBar>, config: FlagConfig, index: usize) -> Option<Rejection> {
        let data = symbol_data(PriceSeries::new("FLAG", bars).unwrap(), &config);
        FlagDetector::new(config).evaluate(&data, index).err()
    }

    fn symbol_data(series: PriceSeries, config: &FlagConfig) -> SymbolData {
        SymbolData::new(series, config, &[])
    }

    #[test]
    fn default_config() {
        let c = FlagConfig::default();
        assert_eq!((c.look_back, c.look_forward), (3, 3));
        assert_eq!((c.min_top_len, c.max_top_len), (10, 20));
        assert_eq!((c.min_pole_len, c.max_pole_len), (10, 40));
        assert_eq!(c.min_top_points, 3);
        assert_eq!(c.min_bottom_points, 2);
        assert_eq!(c.max_flat_days, 3);
        assert_eq!(c.trend_filter_period, 100);
        assert!((c.max_retracement - 0.65).abs() < f64::EPSILON);
        assert!((c.slope_tolerance - 0.03).abs() < f64::EPSILON);
    }

    #[test]
    fn price_line_projects_from_anchor() {
        let line = PriceLine {
            anchor_index: 10,
            anchor_value: 100.0,
            slope: 2.0,
        };
        assert!((line.value_at(10) - 100.0).abs() < f64::EPSILON);
        assert!((line.value_at(15) - 110.0).abs() < f64::EPSILON);
        assert!((line.value_at(8) - 96.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scan_finds_consolidation_flags() {
        let config = FlagConfig::default();
        let data = symbol_data(flag_series(), &config);
        let detector = FlagDetector::new(config);

        let flags = detector.scan(&data, detector.min_history());
        assert!(!flags.is_empty());
        for flag in &flags {
            assert!((158..=164).contains(&flag.index), "flag at {}", flag.index);
        }
        // most recent first
        for pair in flags.windows(2) {
            assert!(pair[0].index > pair[1].index);
        }
        assert!(flags.iter().any(|f| f.index == 162));
    }

    #[test]
    fn accepted_flag_geometry() {
        let config = FlagConfig::default();
        let data = symbol_data(flag_series(), &config);
        let detector = FlagDetector::new(config.clone());

        let flag = detector.detect(&data, 162).expect("flag at 162");
        assert_eq!(flag.trigger_date, data.series.bars()[162].date);
        assert_eq!(flag.top.end_index, 162);
        assert_eq!(flag.pole.end_index, flag.top.start_index);
        assert!(flag.target_price > flag.trigger_price);
        assert!(flag.pole.regression.slope > 0.0);
        assert!(flag.pole.regression.r_squared > config.long_trend_r2);
        for slope in [flag.top.top.slope(), flag.top.bottom.slope()] {
            assert!(slope > config.slope_min && slope < config.slope_max);
        }
        assert!(flag.top.top.point_count() >= config.min_top_points);
        assert!(flag.pole_height > 0.0);
        assert!((flag.price_line.value_at(162) - flag.top.bottom.value_at(162)).abs() < 1e-9);
        assert!(flag.sell_target(0.65) > flag.low);
    }

    #[test]
    fn pole_region_is_not_a_flag() {
        let config = FlagConfig::default();
        let data = symbol_data(flag_series(), &config);
        let detector = FlagDetector::new(config);
        assert!(detector.detect(&data, 140).is_none());
        assert!(detector.detect(&data, 130).is_none());
    }

    #[test]
    fn deep_retracement_rejected() {
        assert_eq!(rejection(flag_bars(), FlagConfig::default(), 162), None);

        let config = FlagConfig {
            max_retracement: 0.01,
            ..FlagConfig::default()
        };
        assert!(matches!(
            rejection(flag_bars(), config, 162),
            Some(Rejection::Retraced { .. })
        ));
    }

    #[test]
    fn zero_range_days_in_pole_rejected() {
        let mut bars = flag_bars();
        for bar in &mut bars[135..=140] {
            bar.high = bar.close;
            bar.low = bar.close;
        }
        assert_eq!(
            rejection(bars.clone(), FlagConfig::default(), 162),
            Some(Rejection::FlatDays(6))
        );

        let config = FlagConfig {
            max_flat_days: 10,
            ..FlagConfig::default()
        };
        assert_eq!(rejection(bars, config, 162), None);
    }

    #[test]
    fn diverging_channel_rejected() {
        let mut bars = flag_bars();
        // resistance falls 0.05 per bar faster than support
        for (k, bar) in bars.iter_mut().enumerate().take(166).skip(150) {
            bar.high += 0.05 * (165 - k) as f64;
        }
        assert!(matches!(
            rejection(bars.clone(), FlagConfig::default(), 162),
            Some(Rejection::NotParallel { top, bottom })
                if (top + 0.15).abs() < 1e-6 && (bottom + 0.1).abs() < 1e-6
        ));

        let config = FlagConfig {
            slope_tolerance: 0.1,
            ..FlagConfig::default()
        };
        assert_eq!(rejection(bars, config, 162), None);
    }

    #[test]
    fn close_below_trend_sma_rejected() {
        let config = FlagConfig {
            trend_filter_period: 5,
            ..FlagConfig::default()
        };
        assert_eq!(rejection(flag_bars(), FlagConfig::default(), 160), None);
        assert!(matches!(
            rejection(flag_bars(), config.clone(), 160),
            Some(Rejection::BelowTrend { .. })
        ));
        assert_eq!(rejection(flag_bars(), config, 162), None);
    }

    #[test]
    fn stricter_point_count_rejects_everything() {
        let config = FlagConfig {
            min_top_points: 50,
            ..FlagConfig::default()
        };
        let data = symbol_data(flag_series(), &config);
        let detector = FlagDetector::new(config);
        assert!(detector.scan(&data, detector.min_history()).is_empty());
    }

    #[test]
    fn flat_series_has_no_extrema_and_no_flag() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars = (0..150)
            .map(|k| OhlcvBar {
                code: "FLAT".into(),
                date: start + chrono::Duration::days(k),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 0,
            })
            .collect();
        let config = FlagConfig::default();
        let data = symbol_data(PriceSeries::new("FLAT", bars).unwrap(), &config);
        assert!(data.maxima.is_empty());
        let detector = FlagDetector::new(config);
        assert!(detector.scan(&data, 60).is_empty());
    }

    #[test]
    fn detect_out_of_range_is_none() {
        let config = FlagConfig::default();
        let data = symbol_data(flag_series(), &config);
        let detector = FlagDetector::new(config);
        assert!(detector.detect(&data, 10_000).is_none());
    }
}
