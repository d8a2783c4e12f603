//! Session logger
//!
//! Records go to stdout at the requested level and to the session log file at
//! `Debug` or finer, so that per-cycle controller records are always on disk.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;

use colored::Colorize;
use log::info;
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while setting up the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Console log level must be `INFO` or finer, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Could not install the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this session.
///
/// `console_level` must be `Info` or finer. Must only be called once.
pub fn logger_init(console_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if console_level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(console_level));
    }

    let file_level = file_level(console_level);

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(file_level)
        .chain(
            fern::Dispatch::new()
                .level(console_level)
                .chain(std::io::stdout()),
        )
        .chain(fern::Dispatch::new().chain(log_file))
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    if let Ok(epoch) = session::get_epoch() {
        info!("Logging started at {}", epoch);
    }
    info!(
        "Console level {:?}, file level {:?}, file {:?}",
        console_level, file_level, session.log_file_path
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The log file never records less than `Debug`.
fn file_level(console_level: LevelFilter) -> LevelFilter {
    console_level.max(LevelFilter::Debug)
}

/// Format one record as `[elapsed TAG] message`, with the target prepended to
/// the message for debug and trace records.
fn format_line(
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    message: &fmt::Arguments,
) -> String {
    let tag = match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    };

    if level > log::Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    } else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_level() {
        assert_eq!(file_level(LevelFilter::Info), LevelFilter::Debug);
        assert_eq!(file_level(LevelFilter::Debug), LevelFilter::Debug);
        assert_eq!(file_level(LevelFilter::Trace), LevelFilter::Trace);
    }

    #[test]
    fn test_format_line() {
        colored::control::set_override(false);

        let line = format_line(1.5, log::Level::Info, "dbw_exec", &format_args!("cycle {}", 3));
        assert_eq!(line, "[  1.500000 INF] cycle 3");

        let line = format_line(
            0.02,
            log::Level::Debug,
            "dbw_lib::twist_ctrl::state",
            &format_args!("Thr {:.3}", 0.25),
        );
        assert_eq!(line, "[  0.020000 DBG] dbw_lib::twist_ctrl::state: Thr 0.250");

        let line = format_line(0.0, log::Level::Error, "x", &format_args!("bad"));
        assert!(line.contains("ERR] bad"));
        assert!(!line.contains("x:"));
    }
}
