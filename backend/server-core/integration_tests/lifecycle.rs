use server_core::ServerProcess;

use models::{ServerKind, ServerSpecBuilder};

use std::time::Duration;

// ============================================================================
// ServerProcess behaviour that needs no child binary.
// Spawning real children is covered by the station crate's integration tests.
// ============================================================================

fn spec() -> models::ServerSpec {
    ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .build()
        .unwrap()
}

#[tokio::test]
async fn given_never_started_when_stopped_then_is_a_no_op() {
    // GIVEN: A controller that never started
    let process = ServerProcess::with_program(spec(), "/nonexistent/station");

    // WHEN: Stopping gracefully and forcefully, then waiting
    let graceful = process.stop(false);
    let kill = process.stop(true);
    process.wait().await;

    // THEN: Nothing fails and nothing is running
    assert!(graceful.is_ok());
    assert!(kill.is_ok());
    assert!(!process.is_running());
    assert_eq!(process.pid(), None);
    assert_eq!(process.local_addr(), None);
}

#[tokio::test]
async fn given_missing_program_when_started_then_spawn_error() {
    let process = ServerProcess::with_program(spec(), "/nonexistent/station");

    let result = process.start("127.0.0.1", 0).await;

    assert!(result.is_err());
    assert!(!process.is_running());
}

/// **VALUE**: A child that exits without announcing an address is a startup error.
///
/// **BUG THIS CATCHES**: Would catch `start` hanging forever on a child that died at once
/// (e.g. the port was taken), or recording a handle for a process that is gone.
#[cfg(unix)]
#[tokio::test]
async fn given_program_that_exits_silently_when_started_then_startup_error() {
    // GIVEN: A program that ignores its arguments and exits
    let process = ServerProcess::with_program(spec(), "/bin/true");

    // WHEN: Starting it
    let result = process.start("127.0.0.1", 0).await;

    // THEN: Startup fails and no handle remains
    assert!(result.is_err());
    assert!(!process.is_running());
    assert!(
        process
            .stop_and_wait(false, Duration::from_millis(100))
            .await
            .unwrap()
    );
}
