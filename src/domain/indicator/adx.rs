//! ADX, the Average Directional Index (Wilder).
//!
//! Steps:
//! 1. True range (with previous close) and +DM / -DM for each bar
//! 2. Seed Wilder sums by plain summation over the first `period` moves, then
//!    smooth recursively: s[i] = s[i-1] - s[i-1]/period + v[i]
//! 3. +DI = 100 * s(+DM) / s(TR), -DI = 100 * s(-DM) / s(TR)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = SMA(DX, period)
//!
//! The first `period` entries of ADX, +DI and -DI are zero; `begin_index = period`.

use super::sma::sma;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxOutput {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub begin_index: usize,
}

pub fn adx(low: &[f64], high: &[f64], close: &[f64], period: usize) -> AdxOutput {
    let n = low.len().min(high.len()).min(close.len());
    let mut plus_di = vec![0.0; n];
    let mut minus_di = vec![0.0; n];
    let mut dx = vec![0.0; n];

    if period == 0 || n <= period {
        return AdxOutput {
            adx: vec![0.0; n],
            plus_di,
            minus_di,
            begin_index: period,
        };
    }

    let mut tr = vec![0.0; n];
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let hl = high[i] - low[i];
        let hc = (high[i] - close[i - 1]).abs();
        let lc = (low[i] - close[i - 1]).abs();
        tr[i] = hl.max(hc).max(lc);

        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let p = period as f64;
    let mut s_tr: f64 = tr[1..=period].iter().sum();
    let mut s_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut s_minus: f64 = minus_dm[1..=period].iter().sum();

    for i in period..n {
        if i > period {
            s_tr = s_tr - s_tr / p + tr[i];
            s_plus = s_plus - s_plus / p + plus_dm[i];
            s_minus = s_minus - s_minus / p + minus_dm[i];
        }

        if s_tr > 0.0 {
            plus_di[i] = 100.0 * s_plus / s_tr;
            minus_di[i] = 100.0 * s_minus / s_tr;
        }

        let di_sum = plus_di[i] + minus_di[i];
        if di_sum > 0.0 {
            dx[i] = 100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum;
        }
    }

    let mut adx = sma(&dx, period);
    adx[..period].fill(0.0);

    AdxOutput {
        adx,
        plus_di,
        minus_di,
        begin_index: period,
    }
}
