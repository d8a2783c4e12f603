//! # First order low pass filter
//!
//! Exponential smoothing with a fixed coefficient derived from the filter's
//! time constant and sample interval:
//!
//! ```text
//! alpha = ts / (tau + ts)
//! y[n]  = alpha * x[n] + (1 - alpha) * y[n-1]
//! ```
//!
//! The first value after construction or a reset seeds the filter and is
//! returned unchanged.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Time constant and sample interval of a low pass filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowPassParams {
    /// Filter time constant
    ///
    /// Units: seconds
    pub time_constant_s: f64,

    /// Interval between filtered samples
    ///
    /// Units: seconds
    pub sample_interval_s: f64,
}

/// A first order low pass filter
#[derive(Debug, Clone, Serialize)]
pub struct LowPassFilter {
    /// The parameters the filter was built from
    params: LowPassParams,

    /// Weight given to the newest sample
    alpha: f64,

    /// The last filtered value, `None` until the filter is seeded
    last_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building a filter.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LowPassError {
    #[error("The time constant must be positive and finite, found {0}")]
    InvalidTimeConstant(f64),

    #[error("The sample interval must be positive and finite, found {0}")]
    InvalidSampleInterval(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPassFilter {
    /// Create a new filter from its time constant and sample interval, both in
    /// seconds.
    pub fn new(time_constant_s: f64, sample_interval_s: f64) -> Result<Self, LowPassError> {
        if !(time_constant_s.is_finite() && time_constant_s > 0.0) {
            return Err(LowPassError::InvalidTimeConstant(time_constant_s));
        }
        if !(sample_interval_s.is_finite() && sample_interval_s > 0.0) {
            return Err(LowPassError::InvalidSampleInterval(sample_interval_s));
        }

        Ok(Self {
            params: LowPassParams {
                time_constant_s,
                sample_interval_s,
            },
            alpha: sample_interval_s / (time_constant_s + sample_interval_s),
            last_value: None,
        })
    }

    /// Create a new filter from a parameters structure.
    pub fn from_params(params: &LowPassParams) -> Result<Self, LowPassError> {
        Self::new(params.time_constant_s, params.sample_interval_s)
    }

    /// Filter the given value, returning the smoothed output.
    pub fn filt(&mut self, value: f64) -> f64 {
        let out = match self.last_value {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };

        self.last_value = Some(out);

        out
    }

    /// Forget the filtered value so that the next sample reseeds the filter.
    pub fn reset(&mut self) {
        self.last_value = None;
    }

    /// The last filtered value, if the filter has been seeded.
    pub fn get(&self) -> Option<f64> {
        self.last_value
    }

    /// True once the filter holds a value.
    pub fn is_ready(&self) -> bool {
        self.last_value.is_some()
    }

    /// The smoothing coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The time constant and sample interval the filter was built from.
    pub fn params(&self) -> &LowPassParams {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alpha() {
        let f = LowPassFilter::new(0.1, 0.1).unwrap();
        assert_eq!(f.alpha(), 0.5);

        let f = LowPassFilter::new(0.66, 0.1).unwrap();
        assert!((f.alpha() - 0.1 / 0.76).abs() < 1e-12);
        assert!(f.alpha() > 0.0 && f.alpha() <= 1.0);
    }

    #[test]
    fn test_params_kept() {
        let params = LowPassParams {
            time_constant_s: 0.66,
            sample_interval_s: 0.1,
        };
        let mut f = LowPassFilter::from_params(&params).unwrap();
        assert_eq!(f.params(), &params);

        // Filtering and resetting leave the parameters alone
        f.filt(1.0);
        f.reset();
        assert_eq!(f.params().time_constant_s, 0.66);
        assert_eq!(f.params().sample_interval_s, 0.1);
    }

    #[test]
    fn test_first_value_seeds() {
        let mut f = LowPassFilter::new(0.66, 0.1).unwrap();
        assert!(!f.is_ready());
        assert_eq!(f.get(), None);

        assert_eq!(f.filt(3.7), 3.7);
        assert!(f.is_ready());
        assert_eq!(f.get(), Some(3.7));
    }

    #[test]
    fn test_blend() {
        let mut f = LowPassFilter::new(0.1, 0.1).unwrap();
        f.filt(0.0);

        assert_eq!(f.filt(1.0), 0.5);
        assert_eq!(f.filt(1.0), 0.75);
    }

    #[test]
    fn test_converges_monotonically() {
        let mut f = LowPassFilter::new(0.66, 0.1).unwrap();
        f.filt(-2.0);

        let target = 5.0;
        let mut prev_dist = std::f64::INFINITY;
        for _ in 0..200 {
            let out = f.filt(target);
            let dist = (target - out).abs();
            assert!(dist <= prev_dist);
            assert!(out <= target);
            prev_dist = dist;
        }

        assert!((f.get().unwrap() - target).abs() < 1e-6);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut f = LowPassFilter::new(0.1, 0.1).unwrap();
        f.filt(10.0);
        f.filt(-4.0);

        f.reset();
        assert!(!f.is_ready());
        assert_eq!(f.filt(0.25), 0.25);
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            LowPassFilter::new(0.0, 0.1).unwrap_err(),
            LowPassError::InvalidTimeConstant(0.0)
        );
        assert_eq!(
            LowPassFilter::new(0.1, -1.0).unwrap_err(),
            LowPassError::InvalidSampleInterval(-1.0)
        );
        assert!(LowPassFilter::new(std::f64::NAN, 0.1).is_err());
    }
}
