//! Standard Deviation indicator.
//!
//! Sample standard deviation (n-1 divisor) over the same shrinking trailing
//! window as `sma`. A single-sample window has deviation 0.

pub fn std_dev(input: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![0.0; input.len()];
    }

    (0..input.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            let window = &input[start..=i];
            let n = window.len();
            if n < 2 {
                return 0.0;
            }

            let mean = window.iter().sum::<f64>() / n as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (n - 1) as f64;

            variance.sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_first_value_is_zero() {
        assert_eq!(std_dev(&[5.0, 6.0], 3)[0], 0.0);
    }

    #[test]
    fn stddev_constant_values() {
        for v in std_dev(&[100.0; 6], 3) {
            assert!(v.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn stddev_basic_calculation() {
        let out = std_dev(&[10.0, 20.0, 30.0], 3);
        // mean 20, squared deviations 100+0+100, / (3-1) = 100
        assert!((out[2] - 10.0).abs() < 1e-10);
    }

    #[test]
    fn stddev_known_values() {
        let input = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = std_dev(&input, 8);
        // population variance 4 → sample variance 32/7
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((out[7] - expected).abs() < 1e-10);
    }

    #[test]
    fn stddev_trailing_window() {
        let out = std_dev(&[1000.0, 1.0, 2.0, 3.0], 3);
        // last window is [1, 2, 3]
        assert!((out[3] - 1.0).abs() < 1e-10);
    }
}
