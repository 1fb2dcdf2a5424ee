use crate::error::lifecycle::LifecycleError;
use crate::lifecycle::spawn::{build_serve_command, parse_listening_addr};

use common::ErrorLocation;
use models::ServerSpec;

use std::env::current_exe;
use std::net::SocketAddr;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, error, info, trace, warn};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, Signal, System};
use tokio::sync::watch;
use tokio::time::sleep;

#[derive(Debug, Clone)]
struct RunningChild {
    pid: u32,
    local_addr: SocketAddr,
    exited: watch::Receiver<bool>,
}

type ChildSlot = Arc<Mutex<Option<RunningChild>>>;

/// Owner-side handle of one server running in its own OS process.
///
/// The child re-executes `program` with the `serve` subcommand. A reaper task
/// awaits its exit status and clears the handle, so [`is_running`](Self::is_running)
/// turns false without any signal handling in the parent.
#[derive(Debug)]
pub struct ServerProcess {
    spec: ServerSpec,
    program: PathBuf,
    child: ChildSlot,
}

fn lock(child: &ChildSlot) -> MutexGuard<'_, Option<RunningChild>> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

#[track_caller]
pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(f)
}

fn is_alive(pid: u32) -> bool {
    with_process(pid, |p| {
        !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
    })
    .unwrap_or(false)
}

impl ServerProcess {
    /// A controller that re-executes the current binary.
    #[track_caller]
    pub fn new(spec: ServerSpec) -> Result<Self, LifecycleError> {
        let program = current_exe().map_err(|e| LifecycleError::Spawn {
            message: format!("Failed to get current executable path: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;
        Ok(Self::with_program(spec, program))
    }

    /// A controller that runs `program serve ...`.
    pub fn with_program(spec: ServerSpec, program: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            program: program.into(),
            child: Arc::new(Mutex::new(None)),
        }
    }

    pub fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.child).as_ref().map(|c| c.pid)
    }

    /// Address the running server accepted on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        lock(&self.child).as_ref().map(|c| c.local_addr)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.child)
            .as_ref()
            .is_some_and(|c| !*c.exited.borrow() && is_alive(c.pid))
    }

    /// Spawn the server and wait until it accepts connections.
    ///
    /// Starting a running server does nothing and returns its current address.
    pub async fn start(&self, host: &str, port: u16) -> Result<SocketAddr, LifecycleError> {
        if let Some(addr) = self.local_addr().filter(|_| self.is_running()) {
            debug!("{} is already running on {addr}", self.spec.name);
            return Ok(addr);
        }

        info!("Starting {} on {host}:{port}", self.spec.name);
        let location = ErrorLocation::from(Location::caller());

        let mut child = build_serve_command(&self.program, &self.spec, host, port)
            .spawn()
            .map_err(|e| LifecycleError::Spawn {
                message: format!("Failed to spawn {}: {e}", self.program.display()),
                location,
                source: Box::new(e),
            })?;

        let pid = child.id().ok_or_else(|| LifecycleError::Startup {
            message: format!("{} exited immediately", self.spec.name),
            location,
        })?;

        let (local_addr, mut output) = match parse_listening_addr(&mut child).await {
            Ok(announced) => announced,
            Err(e) => {
                warn!("{} (PID: {pid}) failed to start, killing it", self.spec.name);
                let _ = child.kill().await;
                return Err(e);
            }
        };

        // Later child output (console logging) goes to our stdout so the pipe never fills.
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            if let Err(e) = tokio::io::copy_buf(&mut output, &mut stdout).await {
                trace!("Stopped forwarding output of PID {pid}: {e}");
            }
        });

        let (exited_tx, exited_rx) = watch::channel(false);
        *lock(&self.child) = Some(RunningChild {
            pid,
            local_addr,
            exited: exited_rx,
        });

        let slot = Arc::clone(&self.child);
        let name = self.spec.name.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => info!("{name} (PID: {pid}) exited: {status}"),
                Err(e) => error!("Failed to reap {name} (PID: {pid}): {e}"),
            }
            let mut guard = lock(&slot);
            if guard.as_ref().is_some_and(|c| c.pid == pid) {
                *guard = None;
            }
            drop(guard);
            exited_tx.send_replace(true);
        });

        info!("{} ready at {local_addr} (PID: {pid})", self.spec.name);
        Ok(local_addr)
    }

    /// Ask the server to stop: `kill = false` drains, `kill = true` drops live
    /// connections. Returns once the signal is sent. Stopping a stopped server
    /// does nothing.
    #[track_caller]
    pub fn stop(&self, kill: bool) -> Result<(), LifecycleError> {
        let Some(pid) = self.pid() else {
            debug!("{} is not running", self.spec.name);
            return Ok(());
        };

        let (signal, label) = if kill {
            (Signal::User1, "SIGUSR1")
        } else {
            (Signal::Term, "SIGTERM")
        };

        match with_process(pid, |p| p.kill_with(signal)) {
            None => {
                debug!("{} (PID: {pid}) already gone", self.spec.name);
                Ok(())
            }
            Some(Some(true)) => {
                info!("Sent {label} to {} (PID: {pid})", self.spec.name);
                Ok(())
            }
            Some(Some(false)) => Err(LifecycleError::Signal {
                message: format!("Failed to send {label} to {} (PID: {pid})", self.spec.name),
                location: ErrorLocation::from(Location::caller()),
            }),
            Some(None) => Err(LifecycleError::Signal {
                message: format!("{label} is not supported on this platform"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Resolves once the child has exited. Returns at once if none is running.
    pub async fn wait(&self) {
        let exited = lock(&self.child).as_ref().map(|c| c.exited.clone());
        if let Some(mut exited) = exited {
            let _ = exited.wait_for(|exited| *exited).await;
        }
    }

    /// [`stop`](Self::stop), then poll with exponential backoff until the
    /// process is gone or `max_elapsed` passes. Returns whether it stopped.
    pub async fn stop_and_wait(
        &self,
        kill: bool,
        max_elapsed: Duration,
    ) -> Result<bool, LifecycleError> {
        self.stop(kill)?;

        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        loop {
            if !self.is_running() {
                debug!("{} stopped", self.spec.name);
                return Ok(true);
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("{} still running, retrying after {duration:?}", self.spec.name);
                    sleep(duration).await;
                }
                None => {
                    warn!("{} still running after {max_elapsed:?}", self.spec.name);
                    return Ok(false);
                }
            }
        }
    }
}
