use common::ErrorLocation;

use server_core::CoreError;
use server_core::error::config::ConfigError;
use server_core::error::lifecycle::LifecycleError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the `station` binary.
///
/// Library errors are flattened to their message here; the location points
/// at the station call that received them.
#[derive(Debug, Error)]
pub enum StationError {
    /// Error from this app
    #[error("Station Error: {message} {location}")]
    Station {
        message: String,
        location: ErrorLocation,
    },

    /// Logger could not be set up
    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded or turned into server specs
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Error from server-core operations (bind, spawn, signal delivery)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for StationError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        StationError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<LifecycleError> for StationError {
    #[track_caller]
    fn from(error: LifecycleError) -> Self {
        StationError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for StationError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        StationError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
