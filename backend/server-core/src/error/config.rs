//! Failures around `station.json`.

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Station Config Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("Station Config Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Station Config Write Error: {message} {location}")]
    Write {
        message: String,
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// One setting holds a value no server can run with.
    #[error("Station Config Invalid Setting Error: {setting}: {message} {location}")]
    InvalidSetting {
        setting: String,
        message: String,
        location: ErrorLocation,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn read(path: &Path, source: IoError) -> Self {
        ConfigError::Read {
            message: format!("Cannot read {}: {source}", path.display()),
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn parse(path: &Path, source: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: format!("{} is not valid station JSON: {source}", path.display()),
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn write(path: &Path, source: IoError) -> Self {
        ConfigError::Write {
            message: format!("Cannot write {}: {source}", path.display()),
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn invalid(setting: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            setting: setting.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
