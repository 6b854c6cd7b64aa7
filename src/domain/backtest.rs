//! Backtest loop for one symbol.
//!
//! Days are walked in order from the minimum-history floor. Each day the
//! detector is run; a flag found on day `i` becomes tradable once its last
//! extremum is confirmed (`i + look_forward < d`) and stays tradable for one
//! pole length. When several flags are tradable the most recent one wins,
//! and a flag is never traded twice.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;

use crate::domain::account::Account;
use crate::domain::code_data::SymbolData;
use crate::domain::error::FlagtraderError;
use crate::domain::flag::{Flag, FlagDetector};
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Walk the full history and trade.
    #[default]
    Backtest,
    /// Evaluate only the most recent bar; no trades.
    LatestOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Fixed fee per trade.
    pub commission: f64,
    pub min_data_points: usize,
    pub mode: RunMode,
    /// Indicators computed alongside the run; their latest values are reported.
    pub indicators: Vec<IndicatorType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub direction: Direction,
    pub price: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub code: String,
    pub account: Account,
    /// Chronological.
    pub signals: Vec<Signal>,
    /// Accepted flags, chronological.
    pub flags: Vec<Flag>,
    /// Warmed-up indicator values on the last bar.
    pub latest_indicators: Vec<(IndicatorType, f64)>,
}

pub fn run_backtest(
    series: &PriceSeries,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, FlagtraderError> {
    let sliced = series.slice(config.start_date, config.end_date);
    if sliced.len() < config.min_data_points || sliced.is_empty() {
        return Err(FlagtraderError::InsufficientData {
            code: series.code().to_string(),
            bars: sliced.len(),
            minimum: config.min_data_points,
        });
    }

    let data = SymbolData::new(sliced, &strategy.pattern, &config.indicators);
    let detector = FlagDetector::new(strategy.pattern.clone());
    let mut account = Account::new(data.code(), config.initial_capital, config.commission);

    let (signals, flags) = match config.mode {
        RunMode::LatestOnly => {
            let last = data.bar_count() - 1;
            account.rebalance(data.series.bars()[last].close);
            (Vec::new(), detector.detect(&data, last).into_iter().collect())
        }
        RunMode::Backtest => {
            let floor = config.min_data_points.max(detector.min_history());
            trade(&data, &detector, strategy, &mut account, floor)
        }
    };

    let latest_indicators = config
        .indicators
        .iter()
        .filter_map(|&t| data.latest(t).map(|v| (t, v)))
        .collect();

    Ok(BacktestResult {
        code: data.code().to_string(),
        account,
        signals,
        flags,
        latest_indicators,
    })
}

fn trade(
    data: &SymbolData,
    detector: &FlagDetector,
    strategy: &Strategy,
    account: &mut Account,
    floor: usize,
) -> (Vec<Signal>, Vec<Flag>) {
    let bars = data.series.bars();
    let look_forward = detector.config().look_forward;

    let mut flags: BTreeMap<usize, Flag> = BTreeMap::new();
    let mut signals = Vec::new();
    let mut last_traded: Option<usize> = None;
    // (flag index, entry day)
    let mut open_trade: Option<(usize, usize)> = None;

    for day in floor..bars.len() {
        if let Some(flag) = detector.detect(data, day) {
            flags.insert(day, flag);
        }
        let bar = &bars[day];

        match open_trade {
            None => {
                let candidate = flags
                    .range(..day.saturating_sub(look_forward))
                    .next_back()
                    .filter(|(i, _)| last_traded.is_none_or(|t| **i > t))
                    .filter(|(i, f)| day - **i <= f.pole.length);

                if let Some((&flag_index, flag)) = candidate {
                    if strategy.entry.should_enter(flag, bars, day)
                        && account.buy_all(bar.close, bar.date)
                    {
                        debug!(
                            "{}: buy {:.4} @ {:.3} on {} (flag {})",
                            data.code(),
                            account.shares,
                            bar.close,
                            bar.date,
                            flag.trigger_date
                        );
                        signals.push(Signal {
                            direction: Direction::Long,
                            price: bar.close,
                            date: bar.date,
                        });
                        last_traded = Some(flag_index);
                        open_trade = Some((flag_index, day));
                    }
                }
            }
            Some((flag_index, entry_day)) if day != entry_day => {
                let exit = flags
                    .get(&flag_index)
                    .and_then(|flag| strategy.exit.check(flag, bar, account.last_buy_price, day));

                if let Some(exit) = exit {
                    if account.sell_all(exit.price, bar.date) {
                        debug!(
                            "{}: sell @ {:.3} on {} ({:?})",
                            data.code(),
                            exit.price,
                            bar.date,
                            exit.reason
                        );
                        signals.push(Signal {
                            direction: Direction::Short,
                            price: exit.price,
                            date: bar.date,
                        });
                        open_trade = None;
                    }
                }
            }
            Some(_) => {}
        }

        account.rebalance(bar.close);
    }

    (signals, flags.into_values().collect())
}
