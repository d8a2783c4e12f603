//! Implementations for the TwistCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::path::Path;

// Internal
use super::{
    CteStats, LowPassFilter, Params, PidController, TuningParams, TwistCtrlError,
    VehicleParams, YawCtrl,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Twist control module state
pub struct TwistCtrl {
    vehicle: VehicleParams,
    tuning: TuningParams,

    /// Total mass with a full tank
    total_mass_kg: f64,

    /// Fixed cycle period
    sample_period_s: f64,

    yaw_ctrl: YawCtrl,
    throttle_pid: PidController,
    steer_pid: PidController,
    throttle_filter: LowPassFilter,
    steer_filter: LowPassFilter,

    cte_stats: CteStats,

    report: StatusReport,
    arch_report: Archiver,

    output: Option<OutputData>,
    arch_output: Archiver,
}

/// Input data to Twist Control.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct InputData {
    /// Requested forward speed
    ///
    /// Units: meters/second
    pub target_linear_velocity_ms: f64,

    /// Requested yaw rate
    ///
    /// Units: radians/second
    pub target_angular_velocity_rads: f64,

    /// Measured forward speed
    ///
    /// Units: meters/second
    pub current_linear_velocity_ms: f64,

    /// Signed lateral distance to the path, positive to the left
    ///
    /// Units: meters
    pub cte_m: f64,

    /// False while the drive-by-wire system is not in command
    pub enabled: bool,
}

/// Output demands from TwistCtrl that the drive-by-wire system must execute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Throttle demand, within the throttle PID output limits
    pub throttle: f64,

    /// Brake torque demand
    ///
    /// Units: newton meters
    pub brake_nm: f64,

    /// Steering wheel angle demand
    ///
    /// Units: radians
    pub steer_rad: f64,
}

/// Status report for TwistCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// Longitudinal branch taken this cycle
    pub branch: CtrlBranch,

    /// Speed error after target scaling
    ///
    /// Units: meters/second
    pub speed_error_ms: f64,

    /// Steering demand from the cross track error PID
    ///
    /// Units: radians
    pub pid_steer_rad: f64,

    /// Steering demand from the yaw controller
    ///
    /// Units: radians
    pub yaw_steer_rad: f64,

    /// Cross track error this cycle
    ///
    /// Units: meters
    pub cte_m: f64,

    /// Mean cross track error over all enabled cycles
    ///
    /// Units: meters
    pub mean_cte_m: f64,

    /// Number of enabled cycles so far
    pub num_enabled_cycles: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The longitudinal control branch selected on a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CtrlBranch {
    /// Controller not in command, all demands zero
    Disabled,

    /// Brake torque demanded, throttle zero
    Brake,

    /// Throttle demanded, brake zero
    Throttle,
}

impl Default for CtrlBranch {
    fn default() -> Self {
        CtrlBranch::Disabled
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TwistCtrl {
    type InitData = Params;
    type InitError = TwistCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = TwistCtrlError;

    /// Initialise the TwistCtrl module from its parameters.
    ///
    /// Parameters are validated here, an invalid vehicle or tuning gives an
    /// error and no controller.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let Params { vehicle, tuning } = init_data;

        vehicle.validate().map_err(TwistCtrlError::InvalidVehicleParams)?;
        tuning.validate().map_err(TwistCtrlError::InvalidTuningParams)?;

        let yaw_ctrl = YawCtrl::new(
            vehicle.wheel_base_m,
            vehicle.steer_ratio,
            vehicle.min_speed_ms,
            vehicle.max_lat_accel_mss,
            vehicle.max_steer_angle_rad,
        )
        .map_err(TwistCtrlError::YawCtrlError)?;

        let throttle_filter = LowPassFilter::from_params(&tuning.throttle_filter)
            .map_err(TwistCtrlError::LowPassError)?;
        let steer_filter = LowPassFilter::from_params(&tuning.steer_filter)
            .map_err(TwistCtrlError::LowPassError)?;

        let throttle_pid = PidController::from_gains(&tuning.throttle_pid);
        let steer_pid =
            PidController::from_gains(&tuning.steer_pid_gains(vehicle.max_steer_angle_rad));

        debug!(
            "TwistCtrl initialised: total mass {:.2} kg, period {:.4} s",
            vehicle.total_mass_kg(),
            vehicle.sample_period_s()
        );

        Ok(Self {
            total_mass_kg: vehicle.total_mass_kg(),
            sample_period_s: vehicle.sample_period_s(),
            vehicle,
            tuning,
            yaw_ctrl,
            throttle_pid,
            steer_pid,
            throttle_filter,
            steer_filter,
            cte_stats: CteStats::default(),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            output: None,
            arch_output: Archiver::default(),
        })
    }

    /// Perform cyclic processing of Twist Control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let output = self.control(
            input_data.target_linear_velocity_ms,
            input_data.target_angular_velocity_rads,
            input_data.current_linear_velocity_ms,
            input_data.cte_m,
            input_data.enabled,
        )?;

        Ok((output, self.report))
    }
}

impl Archived for TwistCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Nothing to do until archives have been enabled
        if !self.arch_output.is_open() {
            return Ok(());
        }

        if let Some(output) = self.output {
            self.arch_output.serialise(output)?;
            self.arch_report.serialise(self.report)?;
        }

        Ok(())
    }
}

impl TwistCtrl {

    /// Load the parameter file at the given path (relative to the params
    /// directory) and initialise the module.
    pub fn load(param_file_path: &str) -> Result<Self, TwistCtrlError> {
        let params: Params = params::load(param_file_path)
            .map_err(TwistCtrlError::ParamLoadError)?;

        Self::init(params)
    }

    /// Archive the output and status report into the session's `twist_ctrl`
    /// archive directory.
    pub fn enable_archives(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.enable_archives_in(session.arch_root.join("twist_ctrl"))
    }

    /// Archive the output and status report into the given directory.
    pub fn enable_archives_in<P: AsRef<Path>>(
        &mut self,
        dir: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_output = Archiver::from_file_path(dir.as_ref().join("output.csv"))?;
        self.arch_report = Archiver::from_file_path(dir.as_ref().join("status_report.csv"))?;

        Ok(())
    }

    /// Compute the throttle, brake and steering demands for one cycle.
    ///
    /// # Inputs
    /// - `target_linear_velocity_ms`: requested forward speed
    /// - `target_angular_velocity_rads`: requested yaw rate
    /// - `current_linear_velocity_ms`: measured forward speed
    /// - `cte_m`: cross track error, positive when left of the path
    /// - `enabled`: false when the drive-by-wire system is not in command
    ///
    /// # Outputs
    /// - The demands, all zero when disabled.
    /// - `TwistCtrlError::NonFiniteInput` if any value is NaN or infinite, in
    ///   which case the controller state is left as it was.
    pub fn control(
        &mut self,
        target_linear_velocity_ms: f64,
        target_angular_velocity_rads: f64,
        current_linear_velocity_ms: f64,
        cte_m: f64,
        enabled: bool,
    ) -> Result<OutputData, TwistCtrlError> {
        check_inputs(&[
            ("target_linear_velocity", target_linear_velocity_ms),
            ("target_angular_velocity", target_angular_velocity_rads),
            ("current_linear_velocity", current_linear_velocity_ms),
            ("cte", cte_m),
        ])?;

        // Clear the status report
        self.report = StatusReport {
            num_enabled_cycles: self.cte_stats.num_samples,
            mean_cte_m: self.cte_stats.mean_cte_m,
            ..StatusReport::default()
        };

        let output = if enabled {
            self.control_enabled(
                target_linear_velocity_ms,
                target_angular_velocity_rads,
                current_linear_velocity_ms,
                cte_m,
            )?
        } else {
            self.reset();
            OutputData::default()
        };

        self.output = Some(output);

        Ok(output)
    }

    /// Reset every PID controller and filter.
    ///
    /// The steering filter is reset along with the rest even though it does
    /// not feed the steering output.
    pub fn reset(&mut self) {
        trace!("TwistCtrl: resetting controllers");

        self.throttle_pid.reset();
        self.steer_pid.reset();
        self.throttle_filter.reset();
        self.steer_filter.reset();
    }

    fn control_enabled(
        &mut self,
        target_linear_velocity_ms: f64,
        target_angular_velocity_rads: f64,
        current_linear_velocity_ms: f64,
        cte_m: f64,
    ) -> Result<OutputData, TwistCtrlError> {
        let dt = self.sample_period_s;

        // Aim slightly below the request so that braking starts early
        let target_speed_ms = target_linear_velocity_ms * self.tuning.target_speed_scale;
        let speed_error_ms = target_speed_ms - current_linear_velocity_ms;
        self.report.speed_error_ms = speed_error_ms;

        let overspeed = current_linear_velocity_ms > target_linear_velocity_ms
            && target_linear_velocity_ms > self.tuning.brake_speed_threshold_ms;

        // Steering first, so a rejected step fails before any longitudinal
        // state is reset. Steering is the plain mean of the feedback and
        // feedforward terms.
        let pid_steer_rad = self
            .steer_pid
            .step(-cte_m, dt)
            .map_err(TwistCtrlError::PidError)?;
        let yaw_steer_rad = self.yaw_ctrl.get_steering(
            target_linear_velocity_ms,
            target_angular_velocity_rads,
            current_linear_velocity_ms,
        );
        let steer_rad = (pid_steer_rad + yaw_steer_rad) / 2.0;

        let mut throttle = 0.0;
        let mut brake_nm = 0.0;

        if overspeed || target_speed_ms < self.vehicle.brake_deadband_ms {
            // Deceleration needed to reach the target in one cycle, turned
            // into a brake torque at the wheels
            let accel_mss = speed_error_ms / dt;
            brake_nm = self.tuning.brake_gain
                * accel_mss.abs().max(self.tuning.brake_floor_mss)
                * self.total_mass_kg
                * self.vehicle.wheel_radius_m;

            self.throttle_filter.reset();
            self.throttle_pid.reset();

            self.report.branch = CtrlBranch::Brake;
        } else {
            throttle = self
                .throttle_pid
                .step(speed_error_ms, dt)
                .map_err(TwistCtrlError::PidError)?;

            if self.tuning.filter_throttle {
                throttle = self.throttle_filter.filt(throttle);
            }

            self.report.branch = CtrlBranch::Throttle;
        }

        self.cte_stats.update(cte_m);

        self.report.pid_steer_rad = pid_steer_rad;
        self.report.yaw_steer_rad = yaw_steer_rad;
        self.report.cte_m = cte_m;
        self.report.mean_cte_m = self.cte_stats.mean_cte_m;
        self.report.num_enabled_cycles = self.cte_stats.num_samples;

        debug!(
            "Thr {:.3}, Br {:.3}, PID {:.3}, YAW {:.3}, CTE {:.3}, AVG CTE {:.3}",
            throttle, brake_nm, pid_steer_rad, yaw_steer_rad, cte_m, self.cte_stats.mean_cte_m
        );

        Ok(OutputData {
            throttle,
            brake_nm,
            steer_rad,
        })
    }

    /// The status report of the last cycle.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// The output of the last cycle, if any.
    pub fn output(&self) -> Option<OutputData> {
        self.output
    }

    /// Running cross track error statistics.
    pub fn cte_stats(&self) -> &CteStats {
        &self.cte_stats
    }

    /// The speed error PID.
    pub fn throttle_pid(&self) -> &PidController {
        &self.throttle_pid
    }

    /// The cross track error PID.
    pub fn steer_pid(&self) -> &PidController {
        &self.steer_pid
    }

    /// The filter applied to the throttle PID output.
    pub fn throttle_filter(&self) -> &LowPassFilter {
        &self.throttle_filter
    }

    /// The steering filter, reset on disable but not used in the blend.
    pub fn steer_filter(&self) -> &LowPassFilter {
        &self.steer_filter
    }

    /// The geometric steering controller.
    pub fn yaw_ctrl(&self) -> &YawCtrl {
        &self.yaw_ctrl
    }

    /// The vehicle parameters the module was initialised with.
    pub fn vehicle(&self) -> &VehicleParams {
        &self.vehicle
    }

    /// The tuning the module was initialised with.
    pub fn tuning(&self) -> &TuningParams {
        &self.tuning
    }

    /// Total mass with a full tank.
    ///
    /// Units: kilograms
    pub fn total_mass_kg(&self) -> f64 {
        self.total_mass_kg
    }

    /// The fixed cycle period.
    ///
    /// Units: seconds
    pub fn sample_period_s(&self) -> f64 {
        self.sample_period_s
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_inputs(inputs: &[(&'static str, f64)]) -> Result<(), TwistCtrlError> {
    match inputs.iter().find(|(_, v)| !v.is_finite()) {
        Some(&(name, val)) => Err(TwistCtrlError::NonFiniteInput(name, val)),
        None => Ok(()),
    }
}
