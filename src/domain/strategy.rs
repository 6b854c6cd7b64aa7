//! Strategy composition: a pattern detector configuration plus an entry rule
//! and an exit rule, all driven by the one backtest loop.

use crate::domain::flag::{Flag, FlagConfig};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryRule {
    /// Close above both the trigger and the projected line, opening gap
    /// from the previous close no larger than `max_gap`.
    FlagBreakout { max_gap: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitRule {
    /// Stop below the buy price, take profit at the flag low plus
    /// `take_profit_retracement` of the pole height, or drop below the line.
    FlagTarget { take_profit_retracement: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Opened below the buy price.
    GapDown,
    /// Down day closing below the buy price.
    DownDay,
    Target,
    BelowLine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub price: f64,
    pub reason: ExitReason,
}

impl EntryRule {
    /// `bars[day]` is today; `day` must be at least 1.
    pub fn should_enter(&self, flag: &Flag, bars: &[OhlcvBar], day: usize) -> bool {
        match self {
            EntryRule::FlagBreakout { max_gap } => {
                let Some(prev) = day.checked_sub(1).and_then(|p| bars.get(p)) else {
                    return false;
                };
                let Some(bar) = bars.get(day) else {
                    return false;
                };
                if !(prev.close > 0.0) {
                    return false;
                }
                let gap = (bar.open - prev.close).abs() / prev.close;
                bar.close > flag.trigger_price
                    && bar.close > flag.price_line.value_at(day)
                    && gap <= *max_gap
            }
        }
    }
}

impl ExitRule {
    /// Checks run in priority order; the first match decides the fill.
    pub fn check(&self, flag: &Flag, bar: &OhlcvBar, last_buy_price: f64, day: usize) -> Option<Exit> {
        match self {
            ExitRule::FlagTarget {
                take_profit_retracement,
            } => {
                if bar.open < last_buy_price {
                    return Some(Exit {
                        price: bar.open,
                        reason: ExitReason::GapDown,
                    });
                }
                if bar.is_down_day() && bar.close < last_buy_price {
                    return Some(Exit {
                        price: bar.close,
                        reason: ExitReason::DownDay,
                    });
                }
                if bar.close > flag.sell_target(*take_profit_retracement) {
                    return Some(Exit {
                        price: bar.close,
                        reason: ExitReason::Target,
                    });
                }
                if bar.close < flag.price_line.value_at(day) {
                    return Some(Exit {
                        price: bar.close,
                        reason: ExitReason::BelowLine,
                    });
                }
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub pattern: FlagConfig,
    pub entry: EntryRule,
    pub exit: ExitRule,
}

impl Strategy {
    pub fn flag_breakout(pattern: FlagConfig, max_gap: f64, take_profit_retracement: f64) -> Self {
        Strategy {
            name: "Flag breakout".into(),
            pattern,
            entry: EntryRule::FlagBreakout { max_gap },
            exit: ExitRule::FlagTarget {
                take_profit_retracement,
            },
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::flag_breakout(FlagConfig::default(), 0.05, 0.65)
    }
}
