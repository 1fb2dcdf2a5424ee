use crate::error::CoreError;
use crate::error::lifecycle::LifecycleError;
use crate::handlers::build_handler;
use crate::lifecycle::spawn::LISTENING_MARKER;
use crate::shutdown::{ShutdownController, spawn_signal_relay};
use crate::transport::{Server, ShutdownOutcome};

use common::ErrorLocation;
use models::ServerSpec;

use std::io::Write;
use std::net::SocketAddr;
use std::panic::Location;

use log::info;

/// Body of a server child process: bind, install signal handling, announce
/// the address to the parent, then serve until a drain or kill completes.
pub async fn run_server_process(
    spec: ServerSpec,
    host: &str,
    port: u16,
) -> Result<ShutdownOutcome, CoreError> {
    info!(
        "Starting {} ({} server, {} slots, {:?} idle timeout)",
        spec.name, spec.kind, spec.max_conn, spec.timeout
    );

    let handler = build_handler(&spec)?;
    let server = Server::bind(spec, handler, host, port).await?;

    let controller = ShutdownController::new();
    let relay = spawn_signal_relay(controller.clone())?;
    announce_listening(server.local_addr())?;

    let outcome = server.run(controller.subscribe()).await;
    relay.abort();

    let outcome = outcome?;
    info!("Main server will terminate now ({outcome:?})");
    Ok(outcome)
}

#[track_caller]
fn announce_listening(addr: SocketAddr) -> Result<(), LifecycleError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{LISTENING_MARKER}{addr}")
        .and_then(|()| stdout.flush())
        .map_err(|e| LifecycleError::Startup {
            message: format!("Failed to announce listening address: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
