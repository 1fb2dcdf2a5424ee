//! Logging for the supervisor and for each server process.
//!
//! Always writes a plain-text log file; optionally mirrors to coloured stdout.

use crate::error::StationError;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::io::stdout;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

/// Thread-safe initialization guard.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

/// Log file name of the supervisor process.
pub const SUPERVISOR_LOG_FILE_NAME: &str = "station.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";
const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub log_file: PathBuf,
    pub console: bool,
    pub debug: bool,
}

impl LogSettings {
    pub fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// Initialize the process-wide logger.
///
/// Safe to call more than once: later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or the
/// dispatch cannot be installed.
pub fn initialize(settings: &LogSettings) -> Result<(), StationError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = build_dispatch(settings).and_then(apply);
        if result.is_ok() {
            info!(
                "{LOGGER_INITIALIZED_MESSAGE_PREFIX}{:?} ({})",
                settings.level(),
                settings.log_file.display()
            );
        }
    });

    result
}

#[track_caller]
fn apply(dispatch: Dispatch) -> Result<(), StationError> {
    dispatch.apply().map_err(|e| StationError::Logger {
        message: format!("Failed to initialize logger: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Dispatch for `settings` without installing it.
#[track_caller]
pub(crate) fn build_dispatch(settings: &LogSettings) -> Result<Dispatch, StationError> {
    if let Some(dir) = settings.log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir).map_err(|e| StationError::Logger {
            message: format!("Failed to create log directory {}: {e}", dir.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(log_file(&settings.log_file)?);

    let mut base_dispatch = Dispatch::new().level(settings.level()).chain(file_dispatch);

    if settings.console {
        let color_configuration = ColoredLevelConfig::new()
            .debug(Blue)
            .info(Green)
            .warn(Yellow)
            .error(Red)
            .trace(Magenta);

        let stdout_dispatch = Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{file}:{line}]",
                    date = format_rfc3339(SystemTime::now()),
                    level = color_configuration.color(record.level()),
                    message = message,
                    file = record.file().unwrap_or("unknown"),
                    line = record.line().unwrap_or(0),
                ))
            })
            .chain(stdout());

        base_dispatch = base_dispatch.chain(stdout_dispatch);
    }

    Ok(base_dispatch)
}

#[track_caller]
fn log_file(path: &Path) -> Result<std::fs::File, StationError> {
    fern::log_file(path).map_err(|e| StationError::Logger {
        message: format!("Failed to create log file {}: {e}", path.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}
