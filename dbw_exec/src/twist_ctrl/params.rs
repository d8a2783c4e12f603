//! Parameters structures for TwistCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{LowPassParams, PidGains};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mass of fuel per unit of tank capacity, used to find the total vehicle
/// mass with a full tank.
///
/// Units: kilograms/gallon
pub const GAS_DENSITY: f64 = 2.858;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters as stored in the TwistCtrl parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Vehicle geometry and mass properties
    pub vehicle: VehicleParams,

    /// Controller tuning, every field defaults when not given
    #[serde(default)]
    pub tuning: TuningParams,
}

/// Physical properties of the vehicle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleParams {

    // ---- GEOMETRY ----

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio of steering wheel angle to road wheel angle.
    pub steer_ratio: f64,

    /// The radius of the vehicle's wheels.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    // ---- CAPABILITIES ----

    /// Speed floor used in the steering curvature calculation.
    ///
    /// Units: meters/second
    pub min_speed_ms: f64,

    /// Maximum lateral acceleration demanded by the geometric steering.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Maximum absolute steering wheel angle.
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,

    // ---- MASS ----

    /// Vehicle curb mass.
    ///
    /// Units: kilograms
    pub vehicle_mass_kg: f64,

    /// Capacity of the fuel tank.
    ///
    /// Units: gallons
    pub fuel_capacity_gal: f64,

    // ---- CONTROL ----

    /// Commanded speed below which the vehicle always brakes.
    ///
    /// Units: meters/second
    pub brake_deadband_ms: f64,

    /// Rate at which the controller is called.
    ///
    /// Units: hertz
    pub sample_rate_hz: f64,
}

/// Controller gains and constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TuningParams {
    /// Throttle PID. Output is the throttle demand, normally within [0, 1].
    pub throttle_pid: PidGains,

    /// Steering PID on the negated cross track error. The output is bounded
    /// by the vehicle's maximum steering angle.
    pub steer_pid: SteerPidGains,

    /// Throttle smoothing filter
    pub throttle_filter: LowPassParams,

    /// If false the throttle PID output is used directly.
    pub filter_throttle: bool,

    /// Steering smoothing filter. This filter is kept and reset with the
    /// other controllers but does not take part in the steering blend.
    pub steer_filter: LowPassParams,

    /// Factor applied to the target speed to start braking a little early.
    pub target_speed_scale: f64,

    /// Gain from required deceleration to brake torque.
    pub brake_gain: f64,

    /// Smallest deceleration used for the brake torque.
    ///
    /// Units: meters/second^2
    pub brake_floor_mss: f64,

    /// When overspeeding, the target must be above this speed to brake.
    ///
    /// Units: meters/second
    pub brake_speed_threshold_ms: f64,
}

/// Steering PID gains. The output limits come from the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SteerPidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleParams {
    /// Total vehicle mass assuming a full fuel tank.
    ///
    /// Units: kilograms
    pub fn total_mass_kg(&self) -> f64 {
        self.vehicle_mass_kg + self.fuel_capacity_gal * GAS_DENSITY
    }

    /// Fixed controller timestep.
    ///
    /// Units: seconds
    pub fn sample_period_s(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// Check the parameters are usable.
    ///
    /// On failure the description of the first bad field is returned.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("wheel_base_m", self.wheel_base_m),
            ("steer_ratio", self.steer_ratio),
            ("wheel_radius_m", self.wheel_radius_m),
            ("max_steer_angle_rad", self.max_steer_angle_rad),
            ("vehicle_mass_kg", self.vehicle_mass_kg),
            ("sample_rate_hz", self.sample_rate_hz),
        ];
        let non_negative = [
            ("min_speed_ms", self.min_speed_ms),
            ("max_lat_accel_mss", self.max_lat_accel_mss),
            ("fuel_capacity_gal", self.fuel_capacity_gal),
            ("brake_deadband_ms", self.brake_deadband_ms),
        ];

        check_positive(&positive)?;
        check_non_negative(&non_negative)?;

        // A tiny rate can still overflow the period
        check_positive(&[("sample period (1/sample_rate_hz)", self.sample_period_s())])
    }
}

impl TuningParams {
    /// Check the tuning is usable.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(e) = self.throttle_pid.check() {
            return Err(format!("throttle_pid: {}", e));
        }
        if self.throttle_pid.min_output < 0.0 {
            return Err(format!(
                "throttle_pid: minimum output must not be negative, found {}",
                self.throttle_pid.min_output
            ));
        }

        let steer = [
            ("steer_pid.k_p", self.steer_pid.k_p),
            ("steer_pid.k_i", self.steer_pid.k_i),
            ("steer_pid.k_d", self.steer_pid.k_d),
        ];
        if let Some((name, val)) = steer.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite, found {}", name, val));
        }

        check_positive(&[
            ("throttle_filter.time_constant_s", self.throttle_filter.time_constant_s),
            ("throttle_filter.sample_interval_s", self.throttle_filter.sample_interval_s),
            ("steer_filter.time_constant_s", self.steer_filter.time_constant_s),
            ("steer_filter.sample_interval_s", self.steer_filter.sample_interval_s),
            ("target_speed_scale", self.target_speed_scale),
        ])?;

        if self.target_speed_scale > 1.0 {
            return Err(format!(
                "target_speed_scale must not exceed 1, found {}",
                self.target_speed_scale
            ));
        }

        check_non_negative(&[
            ("brake_gain", self.brake_gain),
            ("brake_floor_mss", self.brake_floor_mss),
            ("brake_speed_threshold_ms", self.brake_speed_threshold_ms),
        ])
    }

    /// Gains for the steering PID with output limits of +/- the given angle.
    pub fn steer_pid_gains(&self, max_steer_angle_rad: f64) -> PidGains {
        PidGains {
            k_p: self.steer_pid.k_p,
            k_i: self.steer_pid.k_i,
            k_d: self.steer_pid.k_d,
            min_output: -max_steer_angle_rad,
            max_output: max_steer_angle_rad,
        }
    }
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            throttle_pid: PidGains {
                k_p: 10.0,
                k_i: 0.0,
                k_d: 5.0,
                min_output: 0.0,
                max_output: 1.0,
            },
            steer_pid: SteerPidGains {
                k_p: 1.5,
                k_i: 0.0,
                k_d: 4.0,
            },
            throttle_filter: LowPassParams {
                time_constant_s: 0.1,
                sample_interval_s: 0.1,
            },
            filter_throttle: true,
            steer_filter: LowPassParams {
                time_constant_s: 0.66,
                sample_interval_s: 0.1,
            },
            target_speed_scale: 0.9,
            brake_gain: 0.33,
            brake_floor_mss: 0.19,
            brake_speed_threshold_ms: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_positive(fields: &[(&str, f64)]) -> Result<(), String> {
    for (name, val) in fields {
        if !(val.is_finite() && *val > 0.0) {
            return Err(format!("{} must be positive and finite, found {}", name, val));
        }
    }
    Ok(())
}

fn check_non_negative(fields: &[(&str, f64)]) -> Result<(), String> {
    for (name, val) in fields {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(format!("{} must be non-negative and finite, found {}", name, val));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const PARAMS_TOML: &str = r#"
        [vehicle]
        wheel_base_m = 2.8498
        steer_ratio = 14.8
        wheel_radius_m = 0.2413
        min_speed_ms = 0.1
        max_lat_accel_mss = 3.0
        max_steer_angle_rad = 8.0
        vehicle_mass_kg = 1736.35
        fuel_capacity_gal = 13.5
        brake_deadband_ms = 0.1
        sample_rate_hz = 50.0
    "#;

    #[test]
    fn test_load_with_default_tuning() {
        let params: Params = util::params::from_str(PARAMS_TOML).unwrap();

        assert_eq!(params.tuning, TuningParams::default());
        assert!(params.vehicle.validate().is_ok());
        assert!(params.tuning.validate().is_ok());
        assert!((params.vehicle.sample_period_s() - 0.02).abs() < 1e-15);
        assert!(
            (params.vehicle.total_mass_kg() - (1736.35 + 13.5 * GAS_DENSITY)).abs() < 1e-9
        );
    }

    #[test]
    fn test_partial_tuning() {
        let toml = format!("{}\n[tuning]\nbrake_gain = 0.5\nfilter_throttle = false\n", PARAMS_TOML);
        let params: Params = util::params::from_str(&toml).unwrap();

        assert_eq!(params.tuning.brake_gain, 0.5);
        assert!(!params.tuning.filter_throttle);
        assert_eq!(params.tuning.target_speed_scale, 0.9);
    }

    #[test]
    fn test_invalid_vehicle() {
        let params: Params = util::params::from_str(PARAMS_TOML).unwrap();

        let mut v = params.vehicle.clone();
        v.sample_rate_hz = 0.0;
        assert!(v.validate().unwrap_err().contains("sample_rate_hz"));

        let mut v = params.vehicle.clone();
        v.max_steer_angle_rad = -1.0;
        assert!(v.validate().unwrap_err().contains("max_steer_angle_rad"));

        let mut v = params.vehicle.clone();
        v.brake_deadband_ms = std::f64::NAN;
        assert!(v.validate().is_err());

        // Positive but small enough that the period overflows to infinity
        let mut v = params.vehicle.clone();
        v.sample_rate_hz = 1e-310;
        assert!(v.validate().unwrap_err().contains("sample period"));
    }

    #[test]
    fn test_invalid_tuning() {
        let mut t = TuningParams::default();
        t.target_speed_scale = 1.5;
        assert!(t.validate().is_err());

        let mut t = TuningParams::default();
        t.throttle_pid.min_output = 2.0;
        assert!(t.validate().unwrap_err().starts_with("throttle_pid"));

        // Throttle demands are never negative
        let mut t = TuningParams::default();
        t.throttle_pid.min_output = -1.0;
        assert!(t.validate().unwrap_err().contains("must not be negative"));

        let mut t = TuningParams::default();
        t.steer_filter.time_constant_s = 0.0;
        assert!(t.validate().is_err());

        let mut t = TuningParams::default();
        t.brake_floor_mss = -0.1;
        assert!(t.validate().is_err());
    }
}
