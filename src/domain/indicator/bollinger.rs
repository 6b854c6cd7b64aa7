//! Bollinger Bands indicator.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + 2 × StdDev
//! - Lower: Middle - 2 × StdDev
//!
//! StdDev is the sample deviation from `std_dev`, so the band is never negative.

use super::sma::sma;
use super::stddev::std_dev;

pub const BAND_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(input: &[f64], period: usize) -> BollingerOutput {
    let middle = sma(input, period);
    let deviation = std_dev(input, period);

    let upper = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m + BAND_WIDTH * d)
        .collect();
    let lower = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m - BAND_WIDTH * d)
        .collect();

    BollingerOutput {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_constant_values() {
        let out = bollinger_bands(&[100.0; 5], 3);
        for i in 0..5 {
            assert!((out.middle[i] - 100.0).abs() < f64::EPSILON);
            assert!((out.upper[i] - 100.0).abs() < f64::EPSILON);
            assert!((out.lower[i] - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn bollinger_basic_calculation() {
        let out = bollinger_bands(&[10.0, 20.0, 30.0], 3);
        // mean 20, sample stddev 10
        assert!((out.middle[2] - 20.0).abs() < 1e-10);
        assert!((out.upper[2] - 40.0).abs() < 1e-10);
        assert!((out.lower[2] - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let out = bollinger_bands(&[3.0, 8.0, 1.0, 9.0, 4.0], 3);
        for i in 0..5 {
            let up = out.upper[i] - out.middle[i];
            let down = out.middle[i] - out.lower[i];
            assert!((up - down).abs() < 1e-10);
        }
    }
}
