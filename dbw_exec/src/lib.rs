//! # Drive-by-wire library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to
//! access items defined inside the drive-by-wire executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Twist control module - converts requested linear and angular velocity into throttle, brake
/// and steering demands
pub mod twist_ctrl;

/// Simulation module - a simple vehicle plant used to exercise the controller without the rest of
/// the autonomy stack
pub mod sim;
