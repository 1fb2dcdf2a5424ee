//! Sensor readings appended to a CSV file whose header grows with new keys.

use crate::error::storage::StorageError;
use crate::handler::{RequestHandler, Response, parse_pairs, pair_value};
use crate::storage;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};

#[derive(Debug)]
pub struct DataHandler {
    data_dir: PathBuf,
    header: Mutex<Vec<String>>,
}

impl DataHandler {
    /// Open (or create) the data directory and load its current header.
    #[track_caller]
    pub fn new(data_dir: &Path) -> Result<Self, StorageError> {
        storage::ensure_dir(data_dir)?;
        let header = storage::read_header(data_dir)?;
        info!(
            "Data handler using {} with header {header:?}",
            data_dir.display()
        );
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            header: Mutex::new(header),
        })
    }

    pub fn header(&self) -> Vec<String> {
        self.header
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, pairs: &[(String, String)]) -> Result<(), StorageError> {
        let mut header = self.header.lock().unwrap_or_else(PoisonError::into_inner);

        let new_keys: Vec<String> = pairs
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !header.contains(*key))
            .cloned()
            .collect();

        if !new_keys.is_empty() {
            let mut extended = header.clone();
            extended.extend(new_keys);
            storage::write_header(&self.data_dir, &extended)?;
            debug!("Header extended to {extended:?}");
            *header = extended;
        }

        let row: Vec<String> = header
            .iter()
            .map(|column| pair_value(pairs, column).unwrap_or_default().to_string())
            .collect();
        storage::append_row(&self.data_dir, &row)
    }
}

impl RequestHandler for DataHandler {
    fn receive(&self, request: &str) -> Response {
        let pairs = match parse_pairs(request) {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("Rejected data request: {e}");
                return Response::bad_request();
            }
        };

        match self.store(&pairs) {
            Ok(()) => Response::ok(),
            Err(_) => Response::internal_error(),
        }
    }
}
