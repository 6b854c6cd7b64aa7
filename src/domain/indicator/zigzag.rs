//! ZigZag filter.
//!
//! Walks forward and records a pivot whenever the relative change from the
//! last pivot exceeds `threshold` (a fraction, 0.05 = 5%). The first and last
//! samples are always pivots. Output is the straight-line interpolation
//! between consecutive pivots.

pub fn zigzag(input: &[f64], threshold: f64) -> Vec<f64> {
    if input.len() < 2 {
        return input.to_vec();
    }

    let pivots = pivots(input, threshold);
    let mut out = vec![0.0; input.len()];

    for pair in pivots.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let step = (input[b] - input[a]) / (b - a) as f64;
        for (k, slot) in out[a..=b].iter_mut().enumerate() {
            *slot = input[a] + step * k as f64;
        }
    }

    out
}

/// Indices of the pivots, ascending.
pub fn pivots(input: &[f64], threshold: f64) -> Vec<usize> {
    let Some(last_index) = input.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut pivots = vec![0];
    let mut anchor = input[0];

    for (i, &value) in input.iter().enumerate().skip(1) {
        let change = if anchor == 0.0 {
            if value == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            ((value - anchor) / anchor).abs()
        };
        if change > threshold {
            pivots.push(i);
            anchor = value;
        }
    }

    if pivots.last() != Some(&last_index) {
        pivots.push(last_index);
    }
    pivots
}
