//! OHLCV bar representation and validated price series.

use chrono::NaiveDate;

use crate::domain::error::FlagtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// open >= close
    pub fn is_down_day(&self) -> bool {
        self.open >= self.close
    }
}

/// Bars for one symbol, earliest first, with strictly increasing dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    code: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    /// Validates ordering. Index arithmetic downstream silently misbehaves on
    /// duplicate or unsorted dates, so both are rejected here.
    pub fn new(code: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, FlagtraderError> {
        let code = code.into();
        for pair in bars.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.date == prev.date {
                return Err(FlagtraderError::MalformedInput {
                    code,
                    reason: format!("duplicate date {}", next.date),
                });
            }
            if next.date < prev.date {
                return Err(FlagtraderError::MalformedInput {
                    code,
                    reason: format!("date {} follows {}", next.date, prev.date),
                });
            }
        }
        Ok(Self { code, bars })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Bars inside the inclusive date range.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        PriceSeries {
            code: self.code.clone(),
            bars,
        }
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "BHP".into(),
            date,
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close,
            volume: 50_000,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn down_day_includes_unchanged() {
        assert!(bar(d(1), 100.0).is_down_day());
        assert!(bar(d(1), 95.0).is_down_day());
        assert!(!bar(d(1), 101.0).is_down_day());
    }

    #[test]
    fn series_accepts_increasing_dates() {
        let series = PriceSeries::new("BHP", vec![bar(d(1), 1.0), bar(d(2), 2.0), bar(d(5), 3.0)])
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.first_date(), Some(d(1)));
        assert_eq!(series.last_date(), Some(d(5)));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let err = PriceSeries::new("BHP", vec![bar(d(1), 1.0), bar(d(1), 2.0)]).unwrap_err();
        assert!(matches!(err, FlagtraderError::MalformedInput { .. }));
        assert!(err.to_string().contains("duplicate date 2024-01-01"));
    }

    #[test]
    fn series_rejects_out_of_order_dates() {
        let err = PriceSeries::new("BHP", vec![bar(d(3), 1.0), bar(d(2), 2.0)]).unwrap_err();
        assert!(matches!(err, FlagtraderError::MalformedInput { .. }));
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("BHP", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn slice_is_inclusive() {
        let series = PriceSeries::new(
            "BHP",
            (1..=10).map(|i| bar(d(i), i as f64)).collect(),
        )
        .unwrap();
        let sliced = series.slice(d(3), d(6));
        assert_eq!(sliced.closes(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(sliced.code(), "BHP");
    }
}
