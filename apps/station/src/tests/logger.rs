// Unit tests for logger module initialization logic

use crate::error::StationError;
use crate::logger::{LogSettings, build_dispatch, initialize};

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

use std::path::PathBuf;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Both the supervisor and the serve entry point initialise logging, and
/// tests call it repeatedly. Fern panics on a second global logger without the guard.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let dir = TempDir::new().unwrap();
    let settings = LogSettings {
        log_file: dir.path().join("logs").join("station.log"),
        console: false,
        debug: true,
    };

    // WHEN: Calling initialize twice
    let first = initialize(&settings);
    let second = initialize(&settings);

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: An unwritable log location is an error, not a panic.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` or the directory creation being
/// unwrapped, which crashes a server child before it can report anything.
#[test]
fn given_invalid_log_dir_when_building_dispatch_then_returns_logger_error() {
    // GIVEN: A path under /dev/null, which can never be a directory
    let settings = LogSettings {
        log_file: PathBuf::from("/dev/null/invalid-path/server.log"),
        console: true,
        debug: false,
    };

    // WHEN: Building the dispatch
    let result = build_dispatch(&settings);

    // THEN: A logger error is returned
    assert!(matches!(result, Err(StationError::Logger { .. })));
}

#[test]
fn given_missing_log_dir_when_building_dispatch_then_creates_it_and_file() {
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("nested").join("data_server.log");
    let settings = LogSettings {
        log_file: log_file.clone(),
        console: false,
        debug: false,
    };

    assert!(build_dispatch(&settings).is_ok());
    assert!(log_file.exists());
}

#[test]
fn given_debug_flag_when_reading_level_then_debug_else_info() {
    let mut settings = LogSettings {
        log_file: PathBuf::from("x.log"),
        console: false,
        debug: true,
    };
    assert_eq!(settings.level(), LevelFilter::Debug);

    settings.debug = false;
    assert_eq!(settings.level(), LevelFilter::Info);
}
