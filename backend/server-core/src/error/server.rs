use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServerError {
    #[error("Resolve Error: {message} {location}")]
    Resolve {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Accept Error: {message} {location}")]
    Accept {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Signal Error: {message} {location}")]
    Signal {
        message: String,
        location: ErrorLocation,
    },
}

impl ServerError {
    #[track_caller]
    pub fn resolve(message: String) -> Self {
        ServerError::Resolve {
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn bind(message: String, source: IoError) -> Self {
        ServerError::Bind {
            message,
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn accept(source: IoError) -> Self {
        ServerError::Accept {
            message: format!("Listening socket failed: {source}"),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }
}

/// Returned by [`SlotPool::acquire`](crate::slot_pool::SlotPool::acquire) when every slot is taken.
///
/// Not a failure of the server: the transport loop never accepts while the
/// pool is full, so seeing this means admission was bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("All {capacity} connection slots are occupied")]
pub struct PoolFull {
    pub capacity: usize,
}
