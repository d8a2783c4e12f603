//! # Simulation module
//!
//! A simple vehicle plant and demand profile, used by `dbw_exec` to close the
//! loop around TwistCtrl when no real vehicle or planner is attached.
//!
//! The plant is a point mass longitudinally and a kinematic bicycle laterally,
//! following a straight reference path along which the cross track error is
//! measured. It is intentionally crude, its purpose is to show the controller
//! reacting rather than to model a specific vehicle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod plant;
mod profile;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use plant::*;
pub use profile::*;
