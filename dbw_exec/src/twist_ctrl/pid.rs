//! # PID controller
//!
//! A clamped PID controller stepped with an explicit timestep.
//!
//! The integral keeps accumulating while the output is saturated. There is no
//! separate anti-windup on the integral term, the only protection is that
//! `TwistCtrl` resets its controllers whenever it leaves the branch using
//! them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains and output limits of a PID controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Minimum output
    pub min_output: f64,

    /// Maximum output
    pub max_output: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Minimum output
    min_output: f64,

    /// Maximum output
    max_output: f64,

    /// Previous error, zero before the first step and after a reset
    last_error: f64,

    /// The integral accumulation
    integral: f64,

    /// The timestep passed to the last step
    last_dt: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while stepping a PID controller.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PidError {
    #[error("The timestep must be positive and finite, found {0}")]
    InvalidTimestep(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidGains {
    /// Returns `None` if the gains are usable, otherwise a description of the
    /// problem.
    pub fn check(&self) -> Option<String> {
        let vals = [self.k_p, self.k_i, self.k_d, self.min_output, self.max_output];
        if !util::maths::all_finite(&vals) {
            return Some(format!("non-finite gain or limit in {:?}", self))
        }
        if self.min_output > self.max_output {
            return Some(format!(
                "minimum output {} is above maximum output {}",
                self.min_output, self.max_output
            ))
        }

        None
    }
}

impl PidController {

    /// Create a new controller with the given gains and output limits.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, min_output: f64, max_output: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            min_output, max_output,
            last_error: 0f64,
            integral: 0f64,
            last_dt: None,
        }
    }

    /// Create a new controller from a gains structure.
    pub fn from_gains(gains: &PidGains) -> Self {
        Self::new(gains.k_p, gains.k_i, gains.k_d, gains.min_output, gains.max_output)
    }

    /// Get the value of the controller for the given error and timestep.
    ///
    /// The output is clamped into `[min_output, max_output]`. A timestep that
    /// is not positive and finite is rejected and leaves the controller
    /// untouched.
    pub fn step(&mut self, error: f64, dt: f64) -> Result<f64, PidError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PidError::InvalidTimestep(dt))
        }

        // Accumulate the integral term
        self.integral += error * dt;

        let deriv = (error - self.last_error) / dt;

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        // Remember the previous error and timestep
        self.last_error = error;
        self.last_dt = Some(dt);

        Ok(clamp(&out, &self.min_output, &self.max_output))
    }

    /// Zero the integral and previous error. Gains and limits are kept.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.last_error = 0f64;
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The error passed to the last step.
    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// The timestep passed to the last step, if any.
    pub fn last_dt(&self) -> Option<f64> {
        self.last_dt
    }

    /// The output limits as `(min, max)`.
    pub fn limits(&self) -> (f64, f64) {
        (self.min_output, self.max_output)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(2.0, 0.0, 0.0, -10.0, 10.0);

        assert_eq!(pid.step(1.5, 0.1).unwrap(), 3.0);
        assert_eq!(pid.step(-1.0, 0.1).unwrap(), -2.0);
    }

    #[test]
    fn test_first_step_derivative_from_zero() {
        let mut pid = PidController::new(0.0, 0.0, 1.0, -100.0, 100.0);

        // Previous error starts at zero, so the first derivative is e/dt
        assert!((pid.step(1.0, 0.5).unwrap() - 2.0).abs() < 1e-12);

        // Constant error gives zero derivative
        assert!(pid.step(1.0, 0.5).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_integral_grows_linearly() {
        let k_i = 0.5;
        let dt = 0.02;
        let error = 2.0;
        let mut pid = PidController::new(0.0, k_i, 0.0, -1e6, 1e6);

        for n in 1..=50 {
            let out = pid.step(error, dt).unwrap();
            let elapsed = n as f64 * dt;
            assert!((pid.integral() - error * elapsed).abs() < 1e-9);
            assert!((out - k_i * error * elapsed).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_error_keeps_integral_at_zero() {
        let mut pid = PidController::new(1.0, 3.0, 1.0, -1.0, 1.0);

        for _ in 0..100 {
            assert_eq!(pid.step(0.0, 0.02).unwrap(), 0.0);
        }
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_output_always_clamped() {
        let mut pid = PidController::new(1e6, 1e6, 1e6, -0.5, 0.25);

        for e in &[1e9, -1e9, 3.0, -0.001, 0.0, 42.0, -7.5] {
            let out = pid.step(*e, 0.01).unwrap();
            assert!(out >= -0.5 && out <= 0.25, "output {} out of bounds", out);
        }
    }

    #[test]
    fn test_integral_accumulates_while_saturated() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 0.0, 1.0);

        for _ in 0..10 {
            assert_eq!(pid.step(10.0, 0.1).unwrap(), 1.0);
        }

        // Integral carries on past the saturation point
        assert!((pid.integral() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_matches_fresh_controller() {
        let mut used = PidController::new(10.0, 0.3, 5.0, -100.0, 100.0);
        for e in &[1.0, 2.0, -0.5, 0.7] {
            used.step(*e, 0.02).unwrap();
        }
        used.reset();
        assert_eq!(used.integral(), 0.0);
        assert_eq!(used.last_error(), 0.0);
        assert_eq!(used.limits(), (-100.0, 100.0));

        let mut fresh = PidController::new(10.0, 0.3, 5.0, -100.0, 100.0);

        assert_eq!(used.step(0.01, 0.02).unwrap(), fresh.step(0.01, 0.02).unwrap());
        assert_eq!(used.step(-0.03, 0.02).unwrap(), fresh.step(-0.03, 0.02).unwrap());
    }

    #[test]
    fn test_invalid_timestep() {
        let mut pid = PidController::new(1.0, 1.0, 1.0, -1.0, 1.0);

        assert_eq!(pid.step(1.0, 0.0), Err(PidError::InvalidTimestep(0.0)));
        assert_eq!(pid.step(1.0, -0.1), Err(PidError::InvalidTimestep(-0.1)));
        assert!(pid.step(1.0, std::f64::NAN).is_err());
        assert!(pid.step(1.0, std::f64::INFINITY).is_err());

        // Rejected steps leave no trace
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
        assert_eq!(pid.last_dt(), None);
    }

    #[test]
    fn test_gains_check() {
        let mut gains = PidGains {
            k_p: 1.0, k_i: 0.0, k_d: 0.0, min_output: -1.0, max_output: 1.0
        };
        assert!(gains.check().is_none());

        gains.min_output = 2.0;
        assert!(gains.check().is_some());

        gains.min_output = -1.0;
        gains.k_d = std::f64::NAN;
        assert!(gains.check().is_some());
    }
}
