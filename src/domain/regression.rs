//! Ordinary least squares over `(x, y)` points.
//!
//! Degenerate inputs are not errors: with fewer than two points, or when every
//! x is equal, slope, intercept and R² are all NaN. When every y is equal the
//! line is still fitted but R² is NaN. Callers check `r_squared.is_nan()`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl Regression {
    pub fn fit(points: &[Point]) -> Self {
        let n = points.len();
        let degenerate = Self {
            slope: f64::NAN,
            intercept: f64::NAN,
            r_squared: f64::NAN,
            n,
        };
        if n < 2 {
            return degenerate;
        }

        let count = n as f64;
        let mean_x = points.iter().map(|p| p.x).sum::<f64>() / count;
        let mean_y = points.iter().map(|p| p.y).sum::<f64>() / count;

        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for p in points {
            let dx = p.x - mean_x;
            let dy = p.y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        if sxx == 0.0 {
            return degenerate;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = if syy == 0.0 {
            f64::NAN
        } else {
            let sse = (syy - sxy * sxy / sxx).max(0.0);
            (syy - sse) / syy
        };

        Self {
            slope,
            intercept,
            r_squared,
            n,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn is_valid(&self) -> bool {
        self.r_squared.is_finite()
    }
}
