//! Technical indicator engine.
//!
//! Every calculation is a pure function over `&[f64]` returning output of the
//! same length as its input, aligned index-for-index with the price series.
//! Entries before an indicator's warm-up are defined as zero. Multi-output
//! indicators report a `begin_index`; callers that need missing-value
//! semantics must not read before it.
//!
//! This module also provides:
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorValues`: enum for the different output shapes
//! - `IndicatorSeries`: an indicator's outputs for one symbol
//! - `compute_indicators`: builds a set of indicators for a price series

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod highest_lowest;
pub mod macd;
pub mod pvo;
pub mod sma;
pub mod stddev;
pub mod zigzag;

pub use adx::{adx, AdxOutput};
pub use atr::average_true_range;
pub use bollinger::{bollinger_bands, BollingerOutput};
pub use ema::ema;
pub use highest_lowest::{highest, lowest};
pub use macd::{macd, MacdOutput};
pub use pvo::pvo;
pub use sma::sma;
pub use stddev::std_dev;
pub use zigzag::zigzag;

use std::collections::HashMap;
use std::fmt;

use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Stddev(usize),
    Highest(usize),
    Lowest(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger(usize),
    Adx(usize),
    Pvo {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Zigzag {
        threshold_bp: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValues {
    Simple(Vec<f64>),
    Macd(MacdOutput),
    Bollinger(BollingerOutput),
    Adx(AdxOutput),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: IndicatorValues,
}

impl IndicatorSeries {
    /// First index whose value is meaningful.
    pub fn begin_index(&self) -> usize {
        match &self.values {
            IndicatorValues::Macd(out) => out.begin_index,
            IndicatorValues::Adx(out) => out.begin_index,
            IndicatorValues::Simple(_) | IndicatorValues::Bollinger(_) => {
                match self.indicator_type {
                    IndicatorType::Ema(period) => period,
                    _ => 0,
                }
            }
        }
    }

    /// The headline line: the value itself, MACD/PVO line, Bollinger middle, ADX.
    pub fn primary(&self) -> &[f64] {
        match &self.values {
            IndicatorValues::Simple(v) => v,
            IndicatorValues::Macd(out) => &out.line,
            IndicatorValues::Bollinger(out) => &out.middle,
            IndicatorValues::Adx(out) => &out.adx,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Highest(period) => write!(f, "HIGHEST({})", period),
            IndicatorType::Lowest(period) => write!(f, "LOWEST({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger(period) => write!(f, "BOLLINGER({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Pvo { fast, slow, signal } => {
                write!(f, "PVO({},{},{})", fast, slow, signal)
            }
            IndicatorType::Zigzag { threshold_bp } => {
                write!(f, "ZIGZAG({})", *threshold_bp as f64 / 10_000.0)
            }
        }
    }
}

/// Compute one indicator over a price series.
pub fn compute_indicator(series: &PriceSeries, indicator_type: IndicatorType) -> IndicatorSeries {
    let closes = series.closes();
    let values = match indicator_type {
        IndicatorType::Sma(period) => IndicatorValues::Simple(sma(&closes, period)),
        IndicatorType::Ema(period) => IndicatorValues::Simple(ema(&closes, period)),
        IndicatorType::Stddev(period) => IndicatorValues::Simple(std_dev(&closes, period)),
        IndicatorType::Highest(period) => {
            IndicatorValues::Simple(highest(&series.highs(), period))
        }
        IndicatorType::Lowest(period) => IndicatorValues::Simple(lowest(&series.lows(), period)),
        IndicatorType::Atr(period) => IndicatorValues::Simple(average_true_range(
            &series.highs(),
            &series.lows(),
            period,
        )),
        IndicatorType::Macd { fast, slow, signal } => {
            IndicatorValues::Macd(macd(&closes, fast, slow, signal))
        }
        IndicatorType::Bollinger(period) => {
            IndicatorValues::Bollinger(bollinger_bands(&closes, period))
        }
        IndicatorType::Adx(period) => {
            IndicatorValues::Adx(adx(&series.lows(), &series.highs(), &closes, period))
        }
        IndicatorType::Pvo { fast, slow, signal } => {
            IndicatorValues::Macd(pvo(&series.volumes(), fast, slow, signal))
        }
        IndicatorType::Zigzag { threshold_bp } => {
            IndicatorValues::Simple(zigzag(&closes, threshold_bp as f64 / 10_000.0))
        }
    };
    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn compute_indicators(
    series: &PriceSeries,
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    types
        .iter()
        .map(|&t| (t, compute_indicator(series, t)))
        .collect()
}

/// Indicator periods from the `[indicators]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub adx_period: usize,
    pub pvo_fast: usize,
    pub pvo_slow: usize,
    pub pvo_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: 20,
            adx_period: 14,
            pvo_fast: 12,
            pvo_slow: 26,
            pvo_signal: 9,
        }
    }
}

impl IndicatorConfig {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            IndicatorType::Bollinger(self.bollinger_period),
            IndicatorType::Adx(self.adx_period),
            IndicatorType::Pvo {
                fast: self.pvo_fast,
                slow: self.pvo_slow,
                signal: self.pvo_signal,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                code: "TEST".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 + i as i64,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(100).to_string(), "SMA(100)");
        assert_eq!(
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }
            .to_string(),
            "MACD(12,26,9)"
        );
        assert_eq!(
            IndicatorType::Zigzag { threshold_bp: 500 }.to_string(),
            "ZIGZAG(0.05)"
        );
    }

    #[test]
    fn compute_indicators_keys_every_request() {
        let series = make_series(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let types = [
            IndicatorType::Sma(10),
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            IndicatorType::Bollinger(20),
            IndicatorType::Adx(14),
            IndicatorType::Pvo {
                fast: 12,
                slow: 26,
                signal: 9,
            },
        ];
        let map = compute_indicators(&series, &types);
        assert_eq!(map.len(), types.len());
        for t in &types {
            let s = &map[t];
            assert_eq!(s.primary().len(), 60, "{} length", t);
        }
    }

    #[test]
    fn begin_index_by_shape() {
        let series = make_series(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let macd = compute_indicator(
            &series,
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
        );
        assert_eq!(macd.begin_index(), 35);
        assert_eq!(compute_indicator(&series, IndicatorType::Adx(14)).begin_index(), 14);
        assert_eq!(compute_indicator(&series, IndicatorType::Ema(10)).begin_index(), 10);
        assert_eq!(compute_indicator(&series, IndicatorType::Sma(10)).begin_index(), 0);
    }

    #[test]
    fn indicator_config_defaults() {
        let types = IndicatorConfig::default().indicator_types();
        assert_eq!(types.len(), 4);
        assert!(types.contains(&IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9
        }));
        assert!(types.contains(&IndicatorType::Bollinger(20)));
        assert!(types.contains(&IndicatorType::Adx(14)));
    }

    #[test]
    fn atr_uses_high_low_columns() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        let atr = compute_indicator(&series, IndicatorType::Atr(2));
        for v in atr.primary() {
            assert!((v - 2.0).abs() < f64::EPSILON);
        }
    }
}
