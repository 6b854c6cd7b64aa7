//! Rolling highest / lowest over a trailing window.

pub fn highest(input: &[f64], period: usize) -> Vec<f64> {
    rolling(input, period, f64::max)
}

pub fn lowest(input: &[f64], period: usize) -> Vec<f64> {
    rolling(input, period, f64::min)
}

fn rolling(input: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let period = period.max(1);
    (0..input.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            input[start..=i]
                .iter()
                .copied()
                .fold(input[i], pick)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_trailing_not_centered() {
        let out = highest(&[1.0, 5.0, 2.0, 3.0, 1.0, 0.5], 3);
        assert_eq!(out, vec![1.0, 5.0, 5.0, 5.0, 3.0, 3.0]);
    }

    #[test]
    fn lowest_trailing_not_centered() {
        let out = lowest(&[4.0, 2.0, 3.0, 5.0, 6.0, 7.0], 2);
        assert_eq!(out, vec![4.0, 2.0, 2.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn first_value_is_input() {
        assert_eq!(highest(&[9.0, 1.0], 5)[0], 9.0);
        assert_eq!(lowest(&[9.0, 1.0], 5)[0], 9.0);
    }
}
