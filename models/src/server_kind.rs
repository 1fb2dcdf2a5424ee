use crate::{ErrorLocation, ModelError};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;

/// The protocol a server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerKind {
    /// Sensor readings appended to a CSV file with a growing header.
    Data,
    /// Free-form log lines appended to a log file.
    Log,
    /// Clock queries answered with an epoch timestamp.
    Time,
}

impl ServerKind {
    pub const ALL: [ServerKind; 3] = [ServerKind::Data, ServerKind::Log, ServerKind::Time];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Data => "data",
            ServerKind::Log => "log",
            ServerKind::Time => "time",
        }
    }

    /// Name used for the log file and in log lines when none is configured.
    pub fn default_server_name(&self) -> &'static str {
        match self {
            ServerKind::Data => "data_server",
            ServerKind::Log => "log_server",
            ServerKind::Time => "time_server",
        }
    }

    /// Whether the server persists requests and therefore needs a storage directory.
    pub fn needs_storage(&self) -> bool {
        !matches!(self, ServerKind::Time)
    }
}

impl FromStr for ServerKind {
    type Err = ModelError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" => Ok(ServerKind::Data),
            "log" => Ok(ServerKind::Log),
            "time" => Ok(ServerKind::Time),
            other => Err(ModelError::Validation {
                message: format!("Unknown server kind: {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl Display for ServerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(self.as_str())
    }
}
