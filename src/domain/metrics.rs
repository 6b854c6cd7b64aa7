//! Round-trip trades and batch summary statistics.

use chrono::NaiveDate;

use super::account::{Account, ActionKind};
use super::backtest::BacktestResult;

/// A buy paired with the sell that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    /// Sell proceeds minus buy cost, both commissions included.
    pub pnl: f64,
}

impl RoundTrip {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

/// Pair buys and sells from the activity log in order. A trailing buy
/// without a sell is an open position and is left out.
pub fn round_trips(account: &Account) -> Vec<RoundTrip> {
    let mut trips = Vec::new();
    let mut open = None;

    for action in &account.activity {
        match action.kind {
            ActionKind::Buy => open = Some(action),
            ActionKind::Sell => {
                if let Some(buy) = open.take() {
                    trips.push(RoundTrip {
                        symbol: action.symbol.clone(),
                        entry_date: buy.date,
                        exit_date: action.date,
                        entry_price: buy.price,
                        exit_price: action.price,
                        shares: action.shares,
                        pnl: action.amount - buy.amount,
                    });
                }
            }
        }
    }

    trips
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub symbols: usize,
    pub flags_found: usize,
    pub trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub avg_holding_days: f64,
    pub open_positions: usize,
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Percent.
    pub total_return: f64,
}

impl Summary {
    pub fn compute(results: &[BacktestResult]) -> Self {
        let trips: Vec<RoundTrip> = results
            .iter()
            .flat_map(|r| round_trips(&r.account))
            .collect();

        let trades = trips.len();
        let trades_won = trips.iter().filter(|t| t.pnl > 0.0).count();
        let trades_lost = trips.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if trades > 0 {
            trades_won as f64 / trades as f64
        } else {
            0.0
        };
        let avg_holding_days = if trades > 0 {
            trips.iter().map(|t| t.holding_days()).sum::<i64>() as f64 / trades as f64
        } else {
            0.0
        };

        let initial_balance: f64 = results.iter().map(|r| r.account.initial_balance).sum();
        let final_balance: f64 = results.iter().map(|r| r.account.total_balance).sum();
        let total_return = if initial_balance > 0.0 {
            (final_balance / initial_balance - 1.0) * 100.0
        } else {
            0.0
        };

        Summary {
            symbols: results.len(),
            flags_found: results.iter().map(|r| r.flags.len()).sum(),
            trades,
            trades_won,
            trades_lost,
            win_rate,
            avg_holding_days,
            open_positions: results.iter().filter(|r| r.account.is_holding()).count(),
            initial_balance,
            final_balance,
            total_return,
        }
    }
}
