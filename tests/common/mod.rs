#![allow(dead_code)]

use chrono::NaiveDate;
use flagtrader::domain::backtest::{BacktestConfig, RunMode};
use flagtrader::domain::error::FlagtraderError;
pub use flagtrader::domain::ohlcv::OhlcvBar;
use flagtrader::ports::price_history_port::PriceHistoryPort;
use std::collections::HashMap;

pub struct MockPriceHistoryPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceHistoryPort {
    fn fetch_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FlagtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(FlagtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, FlagtraderError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: NaiveDate, open: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date,
        open,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 10_000,
    }
}

pub fn bars_from_closes(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    let mut prev = closes.first().copied().unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(k, &close)| {
            let bar = make_bar(code, start + chrono::Duration::days(k as i64), prev, close);
            prev = close;
            bar
        })
        .collect()
}

/// 120 flat bars, a 30-bar rally, a 16-bar drifting channel, then a breakout.
/// With default settings flags are accepted between bars 158 and 164.
pub fn flag_closes() -> Vec<f64> {
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
    closes
}

pub fn flag_bars(code: &str) -> Vec<OhlcvBar> {
    bars_from_closes(code, date(2023, 1, 1), &flag_closes())
}

/// Gentle upward ramp with no consolidation.
pub fn ramp_bars(code: &str, len: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..len).map(|k| 20.0 + 0.1 * k as f64).collect();
    bars_from_closes(code, date(2023, 1, 1), &closes)
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2020, 1, 1),
        end_date: date(2030, 12, 31),
        initial_capital: 10_000.0,
        commission: 7.0,
        min_data_points: 100,
        mode: RunMode::Backtest,
        indicators: Vec::new(),
    }
}
