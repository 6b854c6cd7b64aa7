//! Simple Moving Average.
//!
//! SMA(n)[i] = mean of the up-to-n most recent values ending at i. Near the
//! start the window is shorter, so SMA[0] == input[0].

pub fn sma(input: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![0.0; input.len()];
    }

    (0..input.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            let window = &input[start..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_first_value_is_input() {
        let out = sma(&[7.0, 9.0, 11.0], 3);
        assert!((out[0] - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_short_window_near_start() {
        let out = sma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert!((out[1] - 15.0).abs() < f64::EPSILON);
        assert!((out[2] - 20.0).abs() < f64::EPSILON);
        assert!((out[3] - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_1_is_identity() {
        let input = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(sma(&input, 1), input.to_vec());
    }

    #[test]
    fn sma_period_0_is_zeroed() {
        assert_eq!(sma(&[1.0, 2.0], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn sma_empty() {
        assert!(sma(&[], 5).is_empty());
    }
}
