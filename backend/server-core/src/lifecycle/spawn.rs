use crate::config::ServerTunables;
use crate::error::lifecycle::LifecycleError;

use common::ErrorLocation;
use models::ServerSpec;

use std::net::SocketAddr;
use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child as TokioChild, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;

pub const SERVE_COMMAND: &str = "serve";
pub const KIND_FLAG: &str = "--kind";
pub const NAME_FLAG: &str = "--name";
pub const HOST_FLAG: &str = "--host";
pub const PORT_FLAG: &str = "--port";
pub const TIMEOUT_FLAG: &str = "--timeout";
pub const MAX_CONN_FLAG: &str = "--max-conn";
pub const ENCODING_FLAG: &str = "--encoding";
pub const STORAGE_DIR_FLAG: &str = "--storage-dir";
pub const LOGS_DIR_FLAG: &str = "--logs-dir";
pub const LOG_CONSOLE_FLAG: &str = "--log-console";
pub const DEBUG_FLAG: &str = "--debug";

/// Prefix of the line a child prints on stdout once it is accepting.
pub const LISTENING_MARKER: &str = "STATION_LISTENING=";

const SPAWN_MAX_OUTPUT_LINES: usize = 100;
const LISTENING_PATTERN: &str = r"^STATION_LISTENING=(?P<addr>\S+)$";
const LISTENING_CAPTURE_ADDR: &str = "addr";

static LISTENING_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_listening_regex() -> &'static Regex {
    LISTENING_REGEX.get_or_init(|| Regex::new(LISTENING_PATTERN).expect("valid regex pattern"))
}

/// Command line that re-runs `program` as the server described by `spec`.
pub fn build_serve_command(
    program: &Path,
    spec: &ServerSpec,
    host: &str,
    port: u16,
) -> TokioCommand {
    let mut cmd = TokioCommand::new(program);
    cmd.arg(SERVE_COMMAND)
        .arg(KIND_FLAG)
        .arg(spec.kind.as_str())
        .arg(NAME_FLAG)
        .arg(&spec.name)
        .arg(HOST_FLAG)
        .arg(host)
        .arg(PORT_FLAG)
        .arg(port.to_string())
        .arg(TIMEOUT_FLAG)
        .arg(spec.timeout.as_secs().max(1).to_string())
        .arg(MAX_CONN_FLAG)
        .arg(spec.max_conn.to_string())
        .arg(ENCODING_FLAG)
        .arg(spec.encoding.label())
        .arg(LOGS_DIR_FLAG)
        .arg(&spec.logs_dir);

    if let Some(dir) = &spec.storage_dir {
        cmd.arg(STORAGE_DIR_FLAG).arg(dir);
    }
    if spec.log_console {
        cmd.arg(LOG_CONSOLE_FLAG);
    }
    if spec.debug {
        cmd.arg(DEBUG_FLAG);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    // Own process group: a terminal Ctrl-C reaches the supervisor only, which
    // decides how to stop its children.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

/// Read the child's stdout until it announces its listening address.
///
/// Returns the address and the reader positioned after the announcement.
pub(crate) async fn parse_listening_addr(
    child: &mut TokioChild,
) -> Result<(SocketAddr, BufReader<ChildStdout>), LifecycleError> {
    let stdout = child.stdout.take().ok_or_else(|| LifecycleError::Startup {
        message: "Child process has no stdout".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    match timeout(ServerTunables::STARTUP_TIMEOUT, scan_for_address(stdout)).await {
        Ok(result) => result,
        Err(_) => Err(LifecycleError::Startup {
            message: format!(
                "Server did not announce its address within {:?}",
                ServerTunables::STARTUP_TIMEOUT
            ),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

async fn scan_for_address(
    stdout: ChildStdout,
) -> Result<(SocketAddr, BufReader<ChildStdout>), LifecycleError> {
    let mut lines = BufReader::new(stdout).lines();
    let re = get_listening_regex();

    for _ in 0..SPAWN_MAX_OUTPUT_LINES {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!("Server output: {line}");

                if let Some(cap) = re.captures(line.trim_end()) {
                    let raw = cap
                        .name(LISTENING_CAPTURE_ADDR)
                        .ok_or_else(|| LifecycleError::Startup {
                            message: format!(
                                "Regex matched but missing '{LISTENING_CAPTURE_ADDR}' capture group"
                            ),
                            location: ErrorLocation::from(Location::caller()),
                        })?
                        .as_str();

                    let addr = raw.parse::<SocketAddr>().map_err(|e| LifecycleError::Startup {
                        message: format!("Invalid listening address '{raw}': {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                    debug!("Server announced {addr}");
                    return Ok((addr, lines.into_inner()));
                }
            }
            Ok(None) => {
                return Err(LifecycleError::Startup {
                    message: "Server exited before announcing its address".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => {
                return Err(LifecycleError::Startup {
                    message: format!("Failed to read server output: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    Err(LifecycleError::Startup {
        message: format!("No listening address in first {SPAWN_MAX_OUTPUT_LINES} lines of output"),
        location: ErrorLocation::from(Location::caller()),
    })
}
