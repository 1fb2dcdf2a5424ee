use crate::error::StationError;

use common::ErrorLocation;
use models::ServerKind;
use server_core::{ServerProcess, StationConfig};

use std::net::SocketAddr;
use std::panic::Location;
use std::time::Duration;

use log::{error, info, warn};

/// How long already-started servers get to drain when a later one fails to start.
pub const CLEANUP_GRACE: Duration = Duration::from_secs(5);

struct Supervised {
    process: ServerProcess,
    port: u16,
}

/// Owns one [`ServerProcess`] per server and starts, stops and awaits them together.
pub struct Supervisor {
    host: String,
    servers: Vec<Supervised>,
}

impl Supervisor {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            servers: Vec::new(),
        }
    }

    /// One server per `kinds` entry, configured from `config`, re-executing this binary.
    #[track_caller]
    pub fn from_config(
        config: &StationConfig,
        kinds: &[ServerKind],
        log_console: bool,
        debug: bool,
    ) -> Result<Self, StationError> {
        let mut supervisor = Self::new(&config.host);
        for &kind in kinds {
            let spec = config.server_spec(kind, log_console, debug)?;
            let process = ServerProcess::new(spec)?;
            supervisor.add(process, config.settings(kind).port);
        }
        Ok(supervisor)
    }

    pub fn add(&mut self, process: ServerProcess, port: u16) {
        self.servers.push(Supervised { process, port });
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerProcess> {
        self.servers.iter().map(|s| &s.process)
    }

    /// Start every server. If one fails, the ones already started are shut
    /// down (see [`Supervisor::shutdown`]) before the failure is returned.
    pub async fn start_all(&self) -> Result<Vec<(String, SocketAddr)>, StationError> {
        let mut started = Vec::with_capacity(self.servers.len());

        for server in &self.servers {
            match server.process.start(&self.host, server.port).await {
                Ok(addr) => started.push((server.process.name().to_string(), addr)),
                Err(e) => {
                    error!("Failed to start {}: {e}", server.process.name());
                    if let Err(stop_error) = self.shutdown(CLEANUP_GRACE).await {
                        warn!("Cleanup after failed start: {stop_error}");
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(started)
    }

    /// Signal every server to stop. Every server is signalled even if an
    /// earlier one fails; the first failure is returned.
    #[track_caller]
    pub fn stop_all(&self, kill: bool) -> Result<(), StationError> {
        let mut first_error = None;

        for server in &self.servers {
            if let Err(e) = server.process.stop(kill) {
                error!("Failed to stop {}: {e}", server.process.name());
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Stop every server gracefully and wait up to `grace` for each to exit.
    /// A server still running after that is killed and given another `grace`.
    /// Returns once every server is gone or has outlived both attempts.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), StationError> {
        for server in &self.servers {
            let name = server.process.name();
            if server.process.stop_and_wait(false, grace).await? {
                continue;
            }

            warn!("{name} did not drain within {grace:?}, killing");
            if !server.process.stop_and_wait(true, grace).await? {
                error!("{name} still running after kill");
            }
        }
        Ok(())
    }

    pub fn any_running(&self) -> bool {
        self.servers.iter().any(|s| s.process.is_running())
    }

    /// Resolves once every server has exited.
    pub async fn wait_all(&self) {
        for server in &self.servers {
            server.process.wait().await;
        }
    }

    /// Wait for all servers to exit, turning interrupts into stop requests:
    /// the first stops gracefully, any later one kills.
    pub async fn run_until_stopped(&self) -> Result<(), StationError> {
        let mut interrupts = 0u32;

        loop {
            tokio::select! {
                _ = self.wait_all() => {
                    info!("All servers stopped");
                    return Ok(());
                }
                interrupted = tokio::signal::ctrl_c() => {
                    interrupted.map_err(|e| StationError::Station {
                        message: format!("Failed to listen for Ctrl-C: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                    interrupts += 1;
                    let kill = interrupts > 1;
                    if kill {
                        warn!("Interrupted again, killing all servers");
                    } else {
                        info!("Interrupted, stopping servers gracefully (Ctrl-C again to kill)");
                    }
                    self.stop_all(kill)?;
                }
            }
        }
    }
}
