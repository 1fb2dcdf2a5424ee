pub mod builder;

use crate::{ServerKind, TextEncoding};

use std::path::PathBuf;
use std::time::Duration;

/// Everything a server process needs to know before it binds.
///
/// Host and port are not part of the spec: they are supplied when the
/// server is started so one spec can be restarted elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub kind: ServerKind,
    pub name: String,
    /// Idle timeout applied to every accepted connection.
    pub timeout: Duration,
    /// Number of connection slots.
    pub max_conn: usize,
    pub encoding: TextEncoding,
    /// Directory the handler persists into. `None` for [`ServerKind::Time`].
    pub storage_dir: Option<PathBuf>,
    pub logs_dir: PathBuf,
    pub log_console: bool,
    pub debug: bool,
}

impl ServerSpec {
    /// Path of this server's own log file.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(format!("{}.log", self.name))
    }
}
