//! Single-symbol cash/position ledger for the backtest.
//!
//! Orders that would break the ledger (non-positive size, cost above cash,
//! selling more than held) are declined with `false` and leave the account
//! untouched. Cash never goes negative; floating-point dust left after an
//! all-in buy is clamped to zero.

use chrono::NaiveDate;

/// Slack allowed when an all-in buy costs a rounding error more than cash.
const CASH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    /// Cash moved, commission included.
    pub amount: f64,
    pub shares: f64,
    pub price: f64,
    pub date: NaiveDate,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub symbol: String,
    pub initial_balance: f64,
    pub cash_balance: f64,
    pub total_balance: f64,
    pub shares: f64,
    pub commission: f64,
    pub last_buy_price: f64,
    pub percentage_gain_loss: f64,
    pub num_buys: usize,
    pub num_sells: usize,
    pub num_trades: usize,
    pub activity: Vec<Action>,
}

impl Account {
    pub fn new(symbol: impl Into<String>, initial_balance: f64, commission: f64) -> Self {
        Self {
            symbol: symbol.into(),
            initial_balance,
            cash_balance: initial_balance,
            total_balance: initial_balance,
            shares: 0.0,
            commission,
            last_buy_price: 0.0,
            percentage_gain_loss: 0.0,
            num_buys: 0,
            num_sells: 0,
            num_trades: 0,
            activity: Vec::new(),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.shares > 0.0
    }

    pub fn buy(&mut self, shares: f64, price: f64, date: NaiveDate) -> bool {
        if !(shares > 0.0) || !shares.is_finite() || !(price > 0.0) {
            return false;
        }
        let cost = shares * price + self.commission;
        if cost > self.cash_balance + CASH_EPSILON {
            return false;
        }

        self.cash_balance = (self.cash_balance - cost).max(0.0);
        self.shares += shares;
        self.last_buy_price = price;
        self.num_buys += 1;
        self.num_trades += 1;
        self.record(ActionKind::Buy, cost, shares, price, date);
        true
    }

    pub fn sell(&mut self, shares: f64, price: f64, date: NaiveDate) -> bool {
        if !(shares > 0.0) || shares > self.shares || !(price >= 0.0) {
            return false;
        }
        let proceeds = shares * price - self.commission;
        if self.cash_balance + proceeds < 0.0 {
            return false;
        }

        self.cash_balance += proceeds;
        self.shares -= shares;
        if self.shares < CASH_EPSILON {
            self.shares = 0.0;
        }
        self.num_sells += 1;
        self.num_trades += 1;
        self.record(ActionKind::Sell, proceeds, shares, price, date);
        true
    }

    /// Spend all cash less one commission.
    pub fn buy_all(&mut self, price: f64, date: NaiveDate) -> bool {
        if !(price > 0.0) {
            return false;
        }
        let shares = (self.cash_balance - self.commission) / price;
        self.buy(shares, price, date)
    }

    pub fn sell_all(&mut self, price: f64, date: NaiveDate) -> bool {
        let shares = self.shares;
        self.sell(shares, price, date)
    }

    /// Mark to market at `price`.
    pub fn rebalance(&mut self, price: f64) {
        self.total_balance = self.cash_balance + self.shares * price;
        self.percentage_gain_loss = if self.initial_balance > 0.0 {
            (self.total_balance / self.initial_balance - 1.0) * 100.0
        } else {
            0.0
        };
    }

    fn record(&mut self, kind: ActionKind, amount: f64, shares: f64, price: f64, date: NaiveDate) {
        self.activity.push(Action {
            kind,
            amount,
            shares,
            price,
            date,
            symbol: self.symbol.clone(),
        });
    }
}
