//! # Twist Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dbw_lib::twist_ctrl::{InputData, Params, TuningParams, TwistCtrl, VehicleParams};
use util::module::State;

fn twist_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build the controller ----

    let params = Params {
        vehicle: VehicleParams {
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
        },
        tuning: TuningParams::default(),
    };

    let mut twist_ctrl = TwistCtrl::init(params).unwrap();

    // Inputs covering the throttle and brake branches
    let throttle_input = InputData {
        target_linear_velocity_ms: 10.0,
        target_angular_velocity_rads: 0.1,
        current_linear_velocity_ms: 8.0,
        cte_m: 0.2,
        enabled: true,
    };
    let brake_input = InputData {
        target_linear_velocity_ms: 5.0,
        current_linear_velocity_ms: 15.0,
        ..throttle_input
    };

    // ---- Benchmark ----

    c.bench_function("twist_ctrl_throttle_cycle", |b| {
        b.iter(|| twist_ctrl.proc(black_box(&throttle_input)).unwrap())
    });

    c.bench_function("twist_ctrl_brake_cycle", |b| {
        b.iter(|| twist_ctrl.proc(black_box(&brake_input)).unwrap())
    });
}

criterion_group!(benches, twist_ctrl_benchmark);
criterion_main!(benches);
