use crate::helpers::{Client, EXIT_TIMEOUT, process};

use models::ServerKind;
use station::supervisor::Supervisor;

use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

// ============================================================================
// Supervisor owning several real server processes
// ============================================================================

#[tokio::test]
async fn given_three_servers_when_started_then_all_serve_and_stop_together() {
    // GIVEN: A supervisor with one server of each kind
    let scratch = TempDir::new().unwrap();
    let mut supervisor = Supervisor::new("127.0.0.1");
    for kind in ServerKind::ALL {
        supervisor.add(process(kind, scratch.path()), 0);
    }

    // WHEN: Starting all
    let started = supervisor.start_all().await.unwrap();

    // THEN: Each one answers on its own address
    assert_eq!(started.len(), 3);
    assert!(supervisor.any_running());
    for (name, addr) in &started {
        let mut client = Client::connect(*addr).await;
        let request = if name == "time_server" {
            "timezone:utc"
        } else {
            "k:v"
        };
        let reply = client.request(request).await.unwrap();
        assert!(reply.starts_with("200"), "{name}: {reply}");
    }

    // WHEN: Stopping all gracefully
    supervisor.stop_all(false).unwrap();

    // THEN: Every process exits
    timeout(EXIT_TIMEOUT, supervisor.wait_all()).await.unwrap();
    assert!(!supervisor.any_running());
}

/// **VALUE**: A failure to start one server does not leave the others orphaned.
///
/// **BUG THIS CATCHES**: Would catch `start_all` returning early without stopping the servers
/// it had already launched, or returning while they are still exiting.
#[tokio::test]
async fn given_second_server_cannot_bind_when_starting_all_then_first_is_stopped() {
    // GIVEN: A free port for the first server and a held port for the second
    let scratch = TempDir::new().unwrap();
    let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let held = holder.local_addr().unwrap().port();
    let mut supervisor = Supervisor::new("127.0.0.1");
    supervisor.add(process(ServerKind::Time, scratch.path()), 0);
    supervisor.add(process(ServerKind::Log, scratch.path()), held);

    // WHEN: Starting all
    let result = supervisor.start_all().await;

    // THEN: The error is returned and the first server is already gone
    assert!(result.is_err());
    assert!(!supervisor.any_running());
    assert!(supervisor.servers().all(|server| server.pid().is_none()));
}

#[tokio::test]
async fn given_running_servers_when_killed_then_all_exit() {
    let scratch = TempDir::new().unwrap();
    let mut supervisor = Supervisor::new("127.0.0.1");
    supervisor.add(process(ServerKind::Data, scratch.path()), 0);
    supervisor.add(process(ServerKind::Time, scratch.path()), 0);
    let started = supervisor.start_all().await.unwrap();
    let mut client = Client::connect(started[0].1).await;
    assert!(client.request("a:1").await.is_some());

    supervisor.stop_all(true).unwrap();

    timeout(EXIT_TIMEOUT, supervisor.wait_all()).await.unwrap();
    assert!(!supervisor.any_running());
    assert_eq!(client.reply().await, None);
}

/// **VALUE**: `shutdown` escalates to a kill when a server cannot drain in time.
///
/// **WHY THIS MATTERS**: A client that never disconnects keeps a draining server alive until
/// its idle timeout. Cleanup must not hang on such a client.
///
/// **BUG THIS CATCHES**: Would catch `shutdown` returning after the graceful attempt alone,
/// leaving a draining process behind.
#[tokio::test]
async fn given_client_holding_connection_when_shutdown_then_escalates_to_kill() {
    // GIVEN: A running server with a connected client that stays open
    let scratch = TempDir::new().unwrap();
    let mut supervisor = Supervisor::new("127.0.0.1");
    supervisor.add(process(ServerKind::Time, scratch.path()), 0);
    let started = supervisor.start_all().await.unwrap();
    let mut client = Client::connect(started[0].1).await;
    assert!(client.request("timezone:utc").await.is_some());

    // WHEN: Shutting down with a grace shorter than the idle timeout
    timeout(EXIT_TIMEOUT, supervisor.shutdown(Duration::from_secs(2)))
        .await
        .unwrap()
        .unwrap();

    // THEN: The server is gone and the held connection was closed
    assert!(!supervisor.any_running());
    assert_eq!(client.reply().await, None);
}
