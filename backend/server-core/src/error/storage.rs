use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Storage IO Error: {path}: {message} {location}")]
    Io {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Storage Config Error: {message} {location}")]
    NotConfigured {
        message: String,
        location: ErrorLocation,
    },
}

impl StorageError {
    #[track_caller]
    pub fn io(path: &Path, action: &str, source: IoError) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            message: format!("{source}. Error {action}."),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }
}
