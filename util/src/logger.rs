//! Logger set up for planner executables
//!
//! Log records go to stdout and to the session's log file, prefixed with the seconds elapsed since
//! the session began. The level can be overridden at run time through [`LOG_LEVEL_ENV_VAR`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use std::str::FromStr;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable which, if set, replaces the level given to [`logger_init`].
pub const LOG_LEVEL_ENV_VAR: &str = "PLANNER_LOG_LEVEL";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Could not parse `{0}` from $PLANNER_LOG_LEVEL as a log level")]
    InvalidEnvLogLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `module_levels` caps the level of individual modules, for example to keep the per sample
/// output of the trajectory simulator out of a debug log.
///
/// # Notes
///
/// - The level used (`min_level` or the one from the environment) must be at least
///   `log::Level::Info`.
/// - This function must only be called once, later calls fail with
///   [`LoggerInitError::FernInitError`].
pub fn logger_init(
    min_level: LevelFilter,
    module_levels: &[(&'static str, LevelFilter)],
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    let env_level = std::env::var(LOG_LEVEL_ENV_VAR).ok();
    let min_level = resolve_level(min_level, env_level.as_deref())?;

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // Debug and trace records carry their target
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level);

    for (module, level) in module_levels {
        dispatch = dispatch.level_for(*module, *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {:?}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (module, level) in module_levels {
        info!("    Log level for {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Pick the level to log at from the default and the environment override, if any.
fn resolve_level(
    default_level: LevelFilter,
    env_level: Option<&str>,
) -> Result<LevelFilter, LoggerInitError> {
    let level = match env_level.map(str::trim) {
        Some(s) if !s.is_empty() => LevelFilter::from_str(s)
            .map_err(|_| LoggerInitError::InvalidEnvLogLevel(s.to_string()))?,
        _ => default_level,
    };

    if level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(level));
    }

    Ok(level)
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_level() {
        assert_eq!(
            resolve_level(LevelFilter::Debug, None).unwrap(),
            LevelFilter::Debug
        );
        assert_eq!(
            resolve_level(LevelFilter::Debug, Some("")).unwrap(),
            LevelFilter::Debug
        );
        assert_eq!(
            resolve_level(LevelFilter::Debug, Some(" trace ")).unwrap(),
            LevelFilter::Trace
        );
        assert_eq!(
            resolve_level(LevelFilter::Info, Some("INFO")).unwrap(),
            LevelFilter::Info
        );

        assert!(matches!(
            resolve_level(LevelFilter::Warn, None),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
        assert!(matches!(
            resolve_level(LevelFilter::Debug, Some("off")),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Off))
        ));
        assert!(matches!(
            resolve_level(LevelFilter::Debug, Some("loud")),
            Err(LoggerInitError::InvalidEnvLogLevel(s)) if s == "loud"
        ));
    }
}
