//! Percentage Volume Oscillator.
//!
//! PVO = 100 * (EMA(fast) - EMA(slow)) / EMA(slow) over volume, with the same
//! signal/histogram/warm-up structure as MACD.

use super::ema::ema;
use super::macd::{finish, MacdOutput};

pub fn pvo(volume: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdOutput {
    let ema_fast = ema(volume, fast);
    let ema_slow = ema(volume, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| if *s == 0.0 { 0.0 } else { 100.0 * (f - s) / s })
        .collect();

    finish(line, slow, signal_period)
}
