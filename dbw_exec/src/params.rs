//! Executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drive-by-wire executable.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Minimum level to log at, one of `info`, `debug` or `trace`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// If true each cycle is paced to the controller's sample rate, otherwise
    /// the simulation runs as fast as possible.
    #[serde(default)]
    pub real_time: bool,

    /// Parameter file for TwistCtrl, relative to the params directory
    pub twist_ctrl_params: String,

    /// Default simulation parameter file, relative to the params directory
    pub sim_params: String,

    /// Limit on consecutive cycle overruns before the executable gives up
    #[serde(default = "default_max_overruns")]
    pub max_consec_cycle_overruns: u64,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_max_overruns() -> u64 {
    5
}
