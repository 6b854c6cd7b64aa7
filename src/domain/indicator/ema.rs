//! Exponential Moving Average.
//!
//! k = 2/(n+1). EMA[0..n] is defined as 0; EMA[n] is seeded with the mean of
//! the first n inputs; thereafter EMA[i] = C[i]*k + EMA[i-1]*(1-k).

pub fn ema(input: &[f64], period: usize) -> Vec<f64> {
    let mut values = vec![0.0; input.len()];
    if period == 0 || input.len() <= period {
        return values;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = input[..period].iter().sum::<f64>() / period as f64;
    values[period] = ema;

    for i in (period + 1)..input.len() {
        ema = input[i] * k + ema * (1.0 - k);
        values[i] = ema;
    }

    values
}
