//! Demand profiles
//!
//! A profile is a list of segments, each holding a twist demand for a fixed
//! duration. It stands in for the planner which would normally provide the
//! demand every cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A constant demand held for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandSegment {
    /// How long this demand is held.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Requested forward speed.
    ///
    /// Units: meters/second
    pub target_speed_ms: f64,

    /// Requested yaw rate.
    ///
    /// Units: radians/second
    #[serde(default)]
    pub target_yaw_rate_rads: f64,

    /// Whether the controller is in command during this segment.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// An ordered list of demand segments.
#[derive(Debug, Clone, Default)]
pub struct DemandProfile {
    segments: Vec<DemandSegment>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DemandProfile {
    /// Create a new profile from its segments.
    pub fn new(segments: Vec<DemandSegment>) -> Self {
        Self { segments }
    }

    /// Total duration of the profile.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s.max(0.0)).sum()
    }

    /// Get the demand active at the given time since the start of the
    /// profile, or `None` once the profile has finished.
    pub fn demand_at(&self, time_s: f64) -> Option<&DemandSegment> {
        if time_s < 0.0 {
            return None;
        }

        let mut end_s = 0.0;
        for seg in &self.segments {
            end_s += seg.duration_s.max(0.0);
            if time_s < end_s {
                return Some(seg);
            }
        }

        None
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod test {
    use super::*;

    fn seg(duration_s: f64, target_speed_ms: f64) -> DemandSegment {
        DemandSegment {
            duration_s,
            target_speed_ms,
            target_yaw_rate_rads: 0.0,
            enabled: true,
        }
    }

    #[test]
    fn test_demand_at() {
        let profile = DemandProfile::new(vec![seg(1.0, 5.0), seg(2.0, 10.0), seg(0.5, 0.0)]);

        assert_eq!(profile.duration_s(), 3.5);
        assert_eq!(profile.demand_at(-0.1), None);
        assert_eq!(profile.demand_at(0.0).unwrap().target_speed_ms, 5.0);
        assert_eq!(profile.demand_at(0.999).unwrap().target_speed_ms, 5.0);
        assert_eq!(profile.demand_at(1.0).unwrap().target_speed_ms, 10.0);
        assert_eq!(profile.demand_at(3.2).unwrap().target_speed_ms, 0.0);
        assert_eq!(profile.demand_at(3.5), None);
    }

    #[test]
    fn test_segment_defaults() {
        let s: DemandSegment =
            util::params::from_str("duration_s = 2.0\ntarget_speed_ms = 4.0").unwrap();

        assert!(s.enabled);
        assert_eq!(s.target_yaw_rate_rads, 0.0);
    }
}
