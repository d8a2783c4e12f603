//! Simulated vehicle plant

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{DemandSegment, Params};
use crate::twist_ctrl::{InputData, OutputData, VehicleParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of the simulated vehicle relative to its reference path.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PlantState {
    /// Time since the start of the simulation
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Forward speed, never negative
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Heading relative to the path, positive anticlockwise
    ///
    /// Units: radians
    pub heading_err_rad: f64,

    /// Lateral offset from the path, positive to the left
    ///
    /// Units: meters
    pub cte_m: f64,

    /// Distance travelled along the path
    ///
    /// Units: meters
    pub distance_m: f64,
}

/// Point mass, kinematic bicycle vehicle model.
#[derive(Debug, Clone)]
pub struct VehiclePlant {
    state: PlantState,

    max_accel_mss: f64,
    drag_coeff: f64,
    total_mass_kg: f64,
    wheel_radius_m: f64,
    wheel_base_m: f64,
    steer_ratio: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehiclePlant {
    /// Create a new plant for the given vehicle.
    pub fn new(params: &Params, vehicle: &VehicleParams) -> Self {
        Self {
            state: PlantState {
                speed_ms: params.initial_speed_ms.max(0.0),
                heading_err_rad: params.initial_heading_rad,
                cte_m: params.initial_cte_m,
                ..PlantState::default()
            },
            max_accel_mss: params.max_accel_mss,
            drag_coeff: params.drag_coeff,
            total_mass_kg: vehicle.total_mass_kg(),
            wheel_radius_m: vehicle.wheel_radius_m,
            wheel_base_m: vehicle.wheel_base_m,
            steer_ratio: vehicle.steer_ratio,
        }
    }

    /// The current plant state.
    pub fn state(&self) -> &PlantState {
        &self.state
    }

    /// Build the controller input for the given demand from the plant's
    /// current state.
    pub fn input_for(&self, demand: &DemandSegment) -> InputData {
        InputData {
            target_linear_velocity_ms: demand.target_speed_ms,
            target_angular_velocity_rads: demand.target_yaw_rate_rads,
            current_linear_velocity_ms: self.state.speed_ms,
            cte_m: self.state.cte_m,
            enabled: demand.enabled,
        }
    }

    /// Advance the plant by `dt_s` under the given demands.
    ///
    /// `path_curvature_m` is the curvature of the reference path at the
    /// vehicle, the heading error is measured against the path tangent.
    pub fn step(&mut self, output: &OutputData, path_curvature_m: f64, dt_s: f64) {
        let s = &mut self.state;

        // Longitudinal
        let brake_decel_mss = output.brake_nm / (self.total_mass_kg * self.wheel_radius_m);
        let accel_mss = output.throttle * self.max_accel_mss
            - brake_decel_mss
            - self.drag_coeff * s.speed_ms;
        s.speed_ms = (s.speed_ms + accel_mss * dt_s).max(0.0);

        // Lateral
        let wheel_angle_rad = output.steer_rad / self.steer_ratio;
        let yaw_rate_rads = s.speed_ms * wheel_angle_rad.tan() / self.wheel_base_m;
        let path_yaw_rate_rads = s.speed_ms * path_curvature_m;

        s.heading_err_rad += (yaw_rate_rads - path_yaw_rate_rads) * dt_s;
        s.cte_m += s.speed_ms * s.heading_err_rad.sin() * dt_s;
        s.distance_m += s.speed_ms * s.heading_err_rad.cos() * dt_s;
        s.time_s += dt_s;

        trace!(
            "Plant: v {:.3} m/s, head err {:.4} rad, cte {:.4} m",
            s.speed_ms, s.heading_err_rad, s.cte_m
        );
    }
}

/// The curvature of the path implied by a demand.
///
/// Units: 1/meters
pub fn demand_curvature_m(demand: &DemandSegment) -> f64 {
    if demand.target_speed_ms.abs() > 0.0 {
        demand.target_yaw_rate_rads / demand.target_speed_ms
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::twist_ctrl::{self, TwistCtrl, TuningParams};
    use crate::sim::DemandProfile;
    use util::module::State;

    fn vehicle() -> VehicleParams {
        VehicleParams {
            wheel_base_m: 2.8498,
            steer_ratio: 14.8,
            wheel_radius_m: 0.2413,
            min_speed_ms: 0.1,
            max_lat_accel_mss: 3.0,
            max_steer_angle_rad: 8.0,
            vehicle_mass_kg: 1736.35,
            fuel_capacity_gal: 13.5,
            brake_deadband_ms: 0.1,
            sample_rate_hz: 50.0,
        }
    }

    fn sim_params(initial_speed_ms: f64, initial_cte_m: f64) -> Params {
        Params {
            initial_speed_ms,
            initial_cte_m,
            initial_heading_rad: 0.0,
            max_accel_mss: 3.0,
            drag_coeff: 0.05,
            profile: vec![],
        }
    }

    fn demand(target_speed_ms: f64) -> DemandSegment {
        DemandSegment {
            duration_s: 1.0,
            target_speed_ms,
            target_yaw_rate_rads: 0.0,
            enabled: true,
        }
    }

    #[test]
    fn test_throttle_and_brake() {
        let mut plant = VehiclePlant::new(&sim_params(5.0, 0.0), &vehicle());

        plant.step(&OutputData { throttle: 1.0, brake_nm: 0.0, steer_rad: 0.0 }, 0.0, 0.1);
        assert!(plant.state().speed_ms > 5.0);

        // A large brake torque stops the vehicle without reversing it
        plant.step(&OutputData { throttle: 0.0, brake_nm: 1e6, steer_rad: 0.0 }, 0.0, 0.1);
        assert_eq!(plant.state().speed_ms, 0.0);
        assert!((plant.state().time_s - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_steering_direction() {
        let mut plant = VehiclePlant::new(&sim_params(10.0, 0.0), &vehicle());

        for _ in 0..10 {
            plant.step(&OutputData { throttle: 0.0, brake_nm: 0.0, steer_rad: 1.0 }, 0.0, 0.02);
        }

        // Positive steer turns left, moving to positive cross track error
        assert!(plant.state().heading_err_rad > 0.0);
        assert!(plant.state().cte_m > 0.0);
    }

    #[test]
    fn test_input_for() {
        let plant = VehiclePlant::new(&sim_params(3.0, -0.4), &vehicle());
        let input = plant.input_for(&demand(7.0));

        assert_eq!(input.target_linear_velocity_ms, 7.0);
        assert_eq!(input.current_linear_velocity_ms, 3.0);
        assert_eq!(input.cte_m, -0.4);
        assert!(input.enabled);
    }

    #[test]
    fn test_demand_curvature() {
        let mut d = demand(10.0);
        d.target_yaw_rate_rads = 0.5;
        assert_eq!(demand_curvature_m(&d), 0.05);

        d.target_speed_ms = 0.0;
        assert_eq!(demand_curvature_m(&d), 0.0);
    }

    #[test]
    fn test_closed_loop() {
        let vehicle = vehicle();
        let mut ctrl = TwistCtrl::init(twist_ctrl::Params {
            vehicle: vehicle.clone(),
            tuning: TuningParams::default(),
        })
        .unwrap();
        let mut plant = VehiclePlant::new(&sim_params(0.0, 0.5), &vehicle);

        let profile = DemandProfile::new(vec![
            DemandSegment { duration_s: 20.0, ..demand(10.0) },
            DemandSegment { duration_s: 10.0, ..demand(5.0) },
            DemandSegment { duration_s: 5.0, ..demand(0.0) },
        ]);

        let dt = ctrl.sample_period_s();
        let mut checks = vec![(19.99, 8.0, 10.0), (29.99, 4.0, 5.5), (34.99, 0.0, 0.0)];
        checks.reverse();

        let mut cycle = 0u64;
        while let Some(d) = profile.demand_at(cycle as f64 * dt) {
            let (output, _) = ctrl.proc(&plant.input_for(d)).unwrap();
            plant.step(&output, demand_curvature_m(d), dt);
            cycle += 1;

            if let Some(&(t, min, max)) = checks.last() {
                if plant.state().time_s >= t {
                    let v = plant.state().speed_ms;
                    assert!(v >= min && v <= max, "speed {} not in [{}, {}] at {} s", v, min, max, t);
                    checks.pop();
                }
            }
        }

        assert!(checks.is_empty());
        assert!(plant.state().cte_m.abs() < 0.05);
        assert_eq!(ctrl.cte_stats().num_samples, cycle);
    }
}
