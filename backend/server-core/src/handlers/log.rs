//! Free-form log lines appended verbatim.

use crate::error::storage::StorageError;
use crate::handler::{RequestHandler, Response};
use crate::storage;

use std::path::{Path, PathBuf};

use log::info;

#[derive(Debug)]
pub struct LogHandler {
    log_dir: PathBuf,
}

impl LogHandler {
    #[track_caller]
    pub fn new(log_dir: &Path) -> Result<Self, StorageError> {
        storage::ensure_dir(log_dir)?;
        info!("Log handler appending to {}", log_dir.display());
        Ok(Self {
            log_dir: log_dir.to_path_buf(),
        })
    }
}

impl RequestHandler for LogHandler {
    fn receive(&self, request: &str) -> Response {
        match storage::append_log_line(&self.log_dir, request) {
            Ok(()) => Response::ok(),
            Err(_) => Response::internal_error(),
        }
    }
}
