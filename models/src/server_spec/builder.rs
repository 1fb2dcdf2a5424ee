use crate::error::model_error::ModelError;
use crate::{ErrorLocation, ServerKind, ServerSpec, TextEncoding};

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_CONN: usize = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOGS_DIR: &str = "logs/";

/// Builder for creating validated [`ServerSpec`] instances.
#[derive(Debug, Default)]
pub struct ServerSpecBuilder {
    kind: Option<ServerKind>,
    name: Option<String>,
    timeout: Option<Duration>,
    max_conn: Option<usize>,
    encoding: Option<TextEncoding>,
    storage_dir: Option<PathBuf>,
    logs_dir: Option<PathBuf>,
    log_console: bool,
    debug: bool,
}

impl ServerSpecBuilder {
    pub fn with_kind(mut self, kind: ServerKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_conn(mut self, max_conn: usize) -> Self {
        self.max_conn = Some(max_conn);
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(dir.into());
        self
    }

    pub fn with_log_console(mut self, log_console: bool) -> Self {
        self.log_console = log_console;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the ServerSpec with validation.
    ///
    /// Unset optional fields fall back to defaults: 30 s timeout, 10 slots,
    /// UTF-8, `logs/`, and the kind's default server name.
    #[track_caller]
    pub fn build(self) -> Result<ServerSpec, ModelError> {
        let kind = self.kind.ok_or_else(|| ModelError::Validation {
            message: String::from("Server kind is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let name = self
            .name
            .unwrap_or_else(|| kind.default_server_name().to_string());

        if name.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Server name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ModelError::Validation {
                message: String::from("Timeout must be greater than zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let max_conn = self.max_conn.unwrap_or(DEFAULT_MAX_CONN);
        if max_conn == 0 {
            return Err(ModelError::Validation {
                message: String::from("max_conn must be at least 1"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if kind.needs_storage() && self.storage_dir.is_none() {
            return Err(ModelError::Validation {
                message: format!("Storage directory is required for the {kind} server"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(ServerSpec {
            kind,
            name,
            timeout,
            max_conn,
            encoding: self.encoding.unwrap_or_default(),
            storage_dir: self.storage_dir,
            logs_dir: self
                .logs_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
            log_console: self.log_console,
            debug: self.debug,
        })
    }
}
