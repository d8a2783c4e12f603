//! # Twist control module
//!
//! Twist control is the innermost loop of the vehicle's autonomy. Each cycle
//! it takes the requested twist (forward speed and yaw rate), the measured
//! forward speed and the cross track error to the path, and produces throttle,
//! brake and steering demands for the drive-by-wire system.
//!
//! Longitudinally the controller picks one of two branches every cycle. When
//! the vehicle is too fast for a target above walking pace, or the target is
//! inside the brake deadband, it brakes with a torque proportional to the
//! deceleration required to reach the target within one cycle. Otherwise a PID
//! on the speed error, followed by a low pass filter, gives the throttle.
//!
//! Steering is the unweighted mean of a PID on the cross track error and the
//! geometric steering angle from `YawCtrl`.
//!
//! Disabling the controller (for instance when the driver takes over) resets
//! every PID and filter so nothing carries over when control resumes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cte_stats;
mod low_pass;
mod params;
mod pid;
mod state;
mod yaw_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cte_stats::*;
pub use low_pass::*;
pub use params::*;
pub use pid::*;
pub use state::*;
pub use yaw_ctrl::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TwistCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TwistCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid vehicle parameters: {0}")]
    InvalidVehicleParams(String),

    #[error("Invalid tuning parameters: {0}")]
    InvalidTuningParams(String),

    #[error("Could not build the yaw controller: {0}")]
    YawCtrlError(YawCtrlError),

    #[error("Could not build a low pass filter: {0}")]
    LowPassError(LowPassError),

    #[error("Input {0} must be finite, found {1}")]
    NonFiniteInput(&'static str, f64),

    #[error("PID controller error: {0}")]
    PidError(PidError),
}
