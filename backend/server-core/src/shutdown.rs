//! Shutdown coordination between signal delivery and the server loops.
//!
//! Signals only post a [`ShutdownMode`]; the accept loop and the workers
//! observe it and act. Modes escalate and never go back.

use crate::error::server::ServerError;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ShutdownMode {
    #[default]
    Running,
    /// Stop accepting, let live connections finish.
    Drain,
    /// Stop accepting, close every live connection now.
    Kill,
}

impl Display for ShutdownMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(match self {
            ShutdownMode::Running => "running",
            ShutdownMode::Drain => "drain",
            ShutdownMode::Kill => "kill",
        })
    }
}

/// Posts shutdown requests.
#[derive(Debug, Clone)]
pub struct ShutdownController {
    sender: Arc<watch::Sender<ShutdownMode>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ShutdownMode::Running);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn mode(&self) -> ShutdownMode {
        *self.sender.borrow()
    }

    /// Escalate to `mode`. Returns `false` when the current mode is already
    /// at or beyond it.
    pub fn request(&self, mode: ShutdownMode) -> bool {
        let escalated = self.sender.send_if_modified(|current| {
            if mode > *current {
                *current = mode;
                true
            } else {
                false
            }
        });
        if escalated {
            info!("Shutdown mode set to {mode}");
        }
        escalated
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes shutdown requests.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<ShutdownMode>,
}

impl ShutdownListener {
    pub fn mode(&self) -> ShutdownMode {
        *self.receiver.borrow()
    }

    /// Resolves with the mode once it leaves [`ShutdownMode::Running`].
    ///
    /// A dropped controller can never escalate further, so it reads as a drain.
    pub async fn stopping(&mut self) -> ShutdownMode {
        match self
            .receiver
            .wait_for(|mode| *mode != ShutdownMode::Running)
            .await
        {
            Ok(mode) => *mode,
            Err(_) => ShutdownMode::Drain,
        }
    }

    /// Resolves once the mode reaches [`ShutdownMode::Kill`]. Never resolves
    /// if the controller is dropped first.
    pub async fn killed(&mut self) {
        let orphaned = self
            .receiver
            .wait_for(|mode| *mode == ShutdownMode::Kill)
            .await
            .is_err();
        if orphaned {
            std::future::pending::<()>().await;
        }
    }
}

/// Installs OS signal handlers that post shutdown modes.
///
/// SIGTERM and SIGINT request a drain, SIGUSR1 requests a kill. Handlers are
/// registered before this returns, so a signal sent right afterwards is not lost.
#[cfg(unix)]
#[track_caller]
pub fn spawn_signal_relay(controller: ShutdownController) -> Result<JoinHandle<()>, ServerError> {
    use common::ErrorLocation;
    use std::panic::Location;
    use tokio::signal::unix::{SignalKind, signal};

    let location = ErrorLocation::from(Location::caller());
    let register = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| ServerError::Signal {
            message: format!("Failed to install {name} handler: {e}"),
            location,
        })
    };

    let mut sigterm = register(SignalKind::terminate(), "SIGTERM")?;
    let mut sigint = register(SignalKind::interrupt(), "SIGINT")?;
    let mut sigusr1 = register(SignalKind::user_defined1(), "SIGUSR1")?;

    Ok(tokio::spawn(async move {
        loop {
            let mode = tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                    ShutdownMode::Drain
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT");
                    ShutdownMode::Drain
                }
                _ = sigusr1.recv() => {
                    info!("Received SIGUSR1");
                    ShutdownMode::Kill
                }
            };
            if !controller.request(mode) {
                warn!("Ignoring {mode} request, already in {} mode", controller.mode());
            }
        }
    }))
}

#[cfg(not(unix))]
#[track_caller]
pub fn spawn_signal_relay(controller: ShutdownController) -> Result<JoinHandle<()>, ServerError> {
    Ok(tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C");
                    // A second Ctrl+C escalates a drain into a kill.
                    let mode = match controller.mode() {
                        ShutdownMode::Running => ShutdownMode::Drain,
                        _ => ShutdownMode::Kill,
                    };
                    controller.request(mode);
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {e}");
                    return;
                }
            }
        }
    }))
}
