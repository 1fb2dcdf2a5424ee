pub mod data;
pub mod log;
pub mod time;

pub use data::DataHandler;
pub use log::LogHandler;
pub use time::TimeHandler;

use crate::error::storage::StorageError;
use crate::handler::RequestHandler;

use common::ErrorLocation;
use models::{ServerKind, ServerSpec};

use std::panic::Location;
use std::sync::Arc;

/// Construct the handler a server of `spec.kind` delegates to.
#[track_caller]
pub fn build_handler(spec: &ServerSpec) -> Result<Arc<dyn RequestHandler>, StorageError> {
    let storage_dir = || {
        spec.storage_dir
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured {
                message: format!("No storage directory configured for {}", spec.name),
                location: ErrorLocation::from(Location::caller()),
            })
    };

    let handler: Arc<dyn RequestHandler> = match spec.kind {
        ServerKind::Data => Arc::new(DataHandler::new(storage_dir()?)?),
        ServerKind::Log => Arc::new(LogHandler::new(storage_dir()?)?),
        ServerKind::Time => Arc::new(TimeHandler::new()),
    };
    Ok(handler)
}
