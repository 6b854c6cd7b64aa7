//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = SMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The first slow+signal entries of all three lines are defined as zero and
//! `begin_index = slow + signal`.

use super::ema::ema;
use super::sma::sma;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Line/signal/histogram triple shared by MACD and PVO.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
    pub begin_index: usize,
}

pub fn macd(close: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdOutput {
    let ema_fast = ema(close, fast);
    let ema_slow = ema(close, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    finish(line, slow, signal_period)
}

/// Signal and histogram from a raw line, then zero the warm-up region.
pub(super) fn finish(mut line: Vec<f64>, slow: usize, signal_period: usize) -> MacdOutput {
    let mut signal = sma(&line, signal_period);
    let mut histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    let begin_index = slow + signal_period;
    let warmup = begin_index.min(line.len());
    for values in [&mut line, &mut signal, &mut histogram] {
        values[..warmup].fill(0.0);
    }

    MacdOutput {
        line,
        signal,
        histogram,
        begin_index,
    }
}
