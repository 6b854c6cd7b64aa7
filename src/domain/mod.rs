//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod extrema;
pub mod regression;
pub mod trend;
pub mod flag;
pub mod account;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod code_data;
pub mod config_validation;
pub mod error;
