//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::DemandSegment;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Forward speed at the start of the simulation.
    ///
    /// Units: meters/second
    #[serde(default)]
    pub initial_speed_ms: f64,

    /// Lateral offset from the path at the start of the simulation, positive
    /// to the left.
    ///
    /// Units: meters
    #[serde(default)]
    pub initial_cte_m: f64,

    /// Heading relative to the path at the start of the simulation.
    ///
    /// Units: radians
    #[serde(default)]
    pub initial_heading_rad: f64,

    /// Acceleration at full throttle.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Linear drag coefficient.
    ///
    /// Units: 1/second
    pub drag_coeff: f64,

    /// Demands to apply, in order.
    pub profile: Vec<DemandSegment>,
}
