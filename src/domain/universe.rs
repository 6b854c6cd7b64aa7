//! Symbol universe and batch runner.
//!
//! Parses code lists from configuration, fetches each series through the
//! price-history port and runs the backtest for every symbol on the rayon
//! pool. A symbol that cannot be fetched or is too short is skipped; it
//! never aborts the batch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, warn};
use rayon::prelude::*;

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::error::FlagtraderError;
use crate::domain::metrics::Summary;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::Strategy;
use crate::ports::price_history_port::PriceHistoryPort;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize, minimum: usize },
    Malformed(String),
    Source(String),
}

impl From<FlagtraderError> for SkipReason {
    fn from(err: FlagtraderError) -> Self {
        match err {
            FlagtraderError::NoData { .. } => SkipReason::NoData,
            FlagtraderError::InsufficientData { bars, minimum, .. } => {
                SkipReason::InsufficientBars { bars, minimum }
            }
            FlagtraderError::MalformedInput { reason, .. } => SkipReason::Malformed(reason),
            other => SkipReason::Source(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// In input order.
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedCode>,
    pub summary: Summary,
}

fn run_symbol(
    port: &dyn PriceHistoryPort,
    code: &str,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, FlagtraderError> {
    let bars = port.fetch_series(code, config.start_date, config.end_date)?;
    if bars.is_empty() {
        return Err(FlagtraderError::NoData {
            code: code.to_string(),
        });
    }
    let series = PriceSeries::new(code, bars)?;
    run_backtest(&series, strategy, config)
}

pub fn run_batch<P>(
    port: &P,
    codes: &[String],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> BatchResult
where
    P: PriceHistoryPort + Sync,
{
    let total = codes.len();
    let processed = AtomicUsize::new(0);
    let with_flags = AtomicUsize::new(0);

    let outcomes: Vec<(String, Result<BacktestResult, FlagtraderError>)> = codes
        .par_iter()
        .map(|code| {
            let outcome = run_symbol(port, code, strategy, config);
            if matches!(&outcome, Ok(r) if !r.flags.is_empty()) {
                with_flags.fetch_add(1, Ordering::Relaxed);
            }
            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 100 == 0 || done == total {
                info!(
                    "processed {}/{} symbols, {} with flags",
                    done,
                    total,
                    with_flags.load(Ordering::Relaxed)
                );
            }
            (code.clone(), outcome)
        })
        .collect();

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (code, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                warn!("skipping {} ({})", code, err);
                skipped.push(SkippedCode {
                    code,
                    reason: err.into(),
                });
            }
        }
    }

    if !skipped.is_empty() {
        info!("ran {} of {} codes", results.len(), total);
    }

    let summary = Summary::compute(&results);
    BatchResult {
        results,
        skipped,
        summary,
    }
}
