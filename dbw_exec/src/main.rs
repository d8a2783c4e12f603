//! Main drive-by-wire executable entry point.
//!
//! # Architecture
//!
//! The executable closes the loop between TwistCtrl and a simulated vehicle:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise TwistCtrl and the simulated vehicle
//!     - Main loop, once per controller sample period:
//!         - Demand acquisition from the demand profile
//!         - TwistCtrl processing
//!         - Archiving
//!         - Vehicle plant update
//!
//! An optional single argument gives the simulation parameter file to use
//! instead of the one named in `dbw_exec.toml`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::env;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use dbw_lib::{
    sim::{self, DemandProfile, VehiclePlant},
    twist_ctrl::{CtrlBranch, TwistCtrl},
};
use params::ExecParams;
use util::{
    archive::{Archived, Archiver},
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "dbw_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams = util::params::load("dbw_exec.toml")
        .wrap_err("Could not load exec params")?;

    let log_level = LevelFilter::from_str(&exec_params.log_level)
        .map_err(|_| eyre!("Invalid log level \"{}\"", exec_params.log_level))?;

    // Initialise logger
    logger_init(log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Drive-by-wire Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let sim_params_path = match args.len() {
        1 => exec_params.sim_params.clone(),
        2 => args[1].clone(),
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1)),
    };

    let sim_params: sim::Params = util::params::load(&sim_params_path)
        .wrap_err_with(|| format!("Could not load simulation params from {}", sim_params_path))?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut twist_ctrl = TwistCtrl::load(&exec_params.twist_ctrl_params)
        .wrap_err("Failed to initialise TwistCtrl")?;
    info!("TwistCtrl init complete");

    // Archives are diagnostic only, the controller runs without them
    if let Err(e) = twist_ctrl.enable_archives(&session) {
        warn!("Could not enable TwistCtrl archives: {}", e);
    }

    let mut plant = VehiclePlant::new(&sim_params, twist_ctrl.vehicle());
    let profile = DemandProfile::new(sim_params.profile.clone());

    let mut arch_plant = Archiver::from_path(&session, "sim/plant_state.csv")
        .unwrap_or_else(|e| {
            warn!("Could not create plant archive: {}", e);
            Archiver::default()
        });

    info!("Simulation init complete");
    info!(
        "    Profile lasts {:.02} s, controller period {:.04} s",
        profile.duration_s(),
        twist_ctrl.sample_period_s()
    );

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(twist_ctrl.sample_period_s());
    let mut num_cycles: u64 = 0;
    let mut num_brake_cycles: u64 = 0;
    let mut num_consec_cycle_overruns: u64 = 0;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- DATA INPUT ----

        let sim_time_s = num_cycles as f64 * twist_ctrl.sample_period_s();
        let demand = match profile.demand_at(sim_time_s) {
            Some(d) => *d,
            None => break,
        };

        // ---- TWIST CONTROL ----

        let (output, report) = twist_ctrl
            .proc(&plant.input_for(&demand))
            .wrap_err("Error during TwistCtrl processing")?;

        if report.branch == CtrlBranch::Brake {
            num_brake_cycles += 1;
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = twist_ctrl.write() {
            warn!("Could not write TwistCtrl archives: {}", e);
        }

        // ---- PLANT ----

        plant.step(
            &output,
            sim::demand_curvature_m(&demand),
            twist_ctrl.sample_period_s(),
        );

        if arch_plant.is_open() {
            if let Err(e) = arch_plant.serialise(plant.state()) {
                warn!("Could not write plant archive: {}", e);
            }
        }

        num_cycles += 1;

        // ---- CYCLE MANAGEMENT ----

        if !exec_params.real_time {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                num_consec_cycle_overruns += 1;

                // If number of overruns greater than the limit exit
                if num_consec_cycle_overruns > exec_params.max_consec_cycle_overruns {
                    return Err(eyre!(
                        "Exceeded the limit of {} consecutive cycle overruns",
                        exec_params.max_consec_cycle_overruns
                    ));
                }
            }
        }
    }

    // ---- SUMMARY ----

    let stats = twist_ctrl.cte_stats();
    let state = plant.state();

    info!("Profile complete after {} cycles", num_cycles);
    info!("    Enabled cycles: {}", stats.num_samples);
    info!("    Brake cycles: {}", num_brake_cycles);
    info!("    Mean CTE: {:.4} m", stats.mean_cte_m);
    info!("    Final speed: {:.3} m/s", state.speed_ms);
    info!("    Final CTE: {:.4} m", state.cte_m);
    info!("    Distance travelled: {:.2} m", state.distance_m);

    Ok(())
}
