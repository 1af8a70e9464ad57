// Least-squares line fitting used to extend partial calibration tables

use crate::error::CompensationError;

/// Denominators at or below this magnitude are treated as singular
pub const SINGULARITY_EPSILON: f64 = 1e-4;

/// Fitted line `offset = k * temperature + d`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearFit {
    /// Slope (µm per °C)
    pub k: f32,
    /// Intercept (µm)
    pub d: f32,
}

impl LinearFit {
    /// Ordinary least-squares fit over `(x, y)` points
    ///
    /// # Returns
    /// * `Ok(LinearFit)` - Fitted slope and intercept
    /// * `Err(CompensationError::SingularFit)` - Fewer than two distinct x
    ///   values, so `n·Σx² − (Σx)²` collapses to zero
    pub fn least_squares<I>(points: I) -> Result<Self, CompensationError>
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut n = 0.0_f64;
        let mut sum_x = 0.0_f64;
        let mut sum_x2 = 0.0_f64;
        let mut sum_xy = 0.0_f64;
        let mut sum_y = 0.0_f64;

        for (x, y) in points {
            let (x, y) = (f64::from(x), f64::from(y));
            n += 1.0;
            sum_x += x;
            sum_x2 += x * x;
            sum_xy += x * y;
            sum_y += y;
        }

        let denom = n * sum_x2 - sum_x * sum_x;
        if denom.abs() <= SINGULARITY_EPSILON {
            return Err(CompensationError::SingularFit);
        }

        let k = (n * sum_xy - sum_x * sum_y) / denom;
        let d = (sum_y - k * sum_x) / n;

        Ok(Self {
            k: k as f32,
            d: d as f32,
        })
    }

    /// Evaluate the line at `x`
    #[inline]
    pub fn evaluate(&self, x: f32) -> f32 {
        self.k * x + self.d
    }
}
