//! # Yaw rate controller
//!
//! Converts a requested yaw rate into a steering wheel angle using the
//! kinematic bicycle model. There is no feedback here, the result is a pure
//! function of the request, the current speed and the vehicle geometry.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use util::maths::{clamp, clamp_abs};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this speed the lateral acceleration limit is not applied, as the
/// yaw rate limit it implies grows without bound.
///
/// Units: meters/second
pub const LAT_ACCEL_LIMIT_MIN_SPEED_MS: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometric steering controller.
#[derive(Debug, Clone, Serialize)]
pub struct YawCtrl {
    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    wheel_base_m: f64,

    /// Ratio between steering wheel angle and road wheel angle
    steer_ratio: f64,

    /// Speed floor used when computing curvature
    ///
    /// Units: meters/second
    min_speed_ms: f64,

    /// Maximum lateral acceleration the steering may demand
    ///
    /// Units: meters/second^2
    max_lat_accel_mss: f64,

    /// Steering wheel angle limit, output is within +/- this value
    ///
    /// Units: radians
    max_steer_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building a yaw controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum YawCtrlError {
    #[error("Invalid yaw controller geometry: {0}")]
    InvalidGeometry(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl YawCtrl {
    /// Create a new yaw controller.
    pub fn new(
        wheel_base_m: f64,
        steer_ratio: f64,
        min_speed_ms: f64,
        max_lat_accel_mss: f64,
        max_steer_angle_rad: f64,
    ) -> Result<Self, YawCtrlError> {
        let positive = [
            ("wheel_base", wheel_base_m),
            ("steer_ratio", steer_ratio),
            ("max_steer_angle", max_steer_angle_rad),
        ];
        let non_negative = [
            ("min_speed", min_speed_ms),
            ("max_lat_accel", max_lat_accel_mss),
        ];

        for (name, val) in positive.iter() {
            if !(val.is_finite() && *val > 0.0) {
                return Err(YawCtrlError::InvalidGeometry(
                    format!("{} must be positive and finite, found {}", name, val)
                ));
            }
        }
        for (name, val) in non_negative.iter() {
            if !(val.is_finite() && *val >= 0.0) {
                return Err(YawCtrlError::InvalidGeometry(
                    format!("{} must be non-negative and finite, found {}", name, val)
                ));
            }
        }

        Ok(Self {
            wheel_base_m,
            steer_ratio,
            min_speed_ms,
            max_lat_accel_mss,
            max_steer_angle_rad,
        })
    }

    /// Get the steering wheel angle which achieves the target yaw rate.
    ///
    /// The target yaw rate is first rescaled by the ratio of the current to
    /// the target speed, so that the path curvature implied by the target
    /// twist is kept when the vehicle isn't yet at the target speed. It is
    /// then limited so that the lateral acceleration at the current speed
    /// doesn't exceed `max_lat_accel`.
    ///
    /// # Inputs
    /// - `target_linear_velocity_ms`: requested forward speed
    /// - `target_angular_velocity_rads`: requested yaw rate
    /// - `current_linear_velocity_ms`: measured forward speed
    pub fn get_steering(
        &self,
        target_linear_velocity_ms: f64,
        target_angular_velocity_rads: f64,
        current_linear_velocity_ms: f64,
    ) -> f64 {
        let mut yaw_rate_rads = if target_linear_velocity_ms.abs() > 0.0 {
            current_linear_velocity_ms * target_angular_velocity_rads / target_linear_velocity_ms
        } else {
            0.0
        };

        if current_linear_velocity_ms.abs() > LAT_ACCEL_LIMIT_MIN_SPEED_MS {
            let max_yaw_rate_rads = (self.max_lat_accel_mss / current_linear_velocity_ms).abs();
            yaw_rate_rads = clamp_abs(yaw_rate_rads, max_yaw_rate_rads);
        }

        if yaw_rate_rads.abs() > 0.0 {
            let speed_ms = current_linear_velocity_ms.max(self.min_speed_ms);
            self.steer_for_curvature(yaw_rate_rads / speed_ms)
        } else {
            0.0
        }
    }

    /// Get the steering wheel angle for the given path curvature, clamped to
    /// the steering limit.
    pub fn steer_for_curvature(&self, curvature_m: f64) -> f64 {
        let steer_rad = (self.wheel_base_m * curvature_m).atan() * self.steer_ratio;

        trace!("YawCtrl: curvature {:.5} 1/m -> steer {:.4} rad", curvature_m, steer_rad);

        clamp(&steer_rad, &-self.max_steer_angle_rad, &self.max_steer_angle_rad)
    }

    /// The steering wheel angle limit.
    pub fn max_steer_angle_rad(&self) -> f64 {
        self.max_steer_angle_rad
    }
}
