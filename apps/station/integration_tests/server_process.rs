use crate::helpers::{Client, EXIT_TIMEOUT, process};

use models::ServerKind;

use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

// ============================================================================
// ServerProcess against the real station binary
// ============================================================================

/// **VALUE**: A started server runs in its own process and answers on the announced address.
///
/// **WHY THIS MATTERS**: This is the whole lifecycle contract: spawn, announce, serve, stop,
/// reap. Every other lifecycle behaviour builds on it.
///
/// **BUG THIS CATCHES**: Would catch the child failing to parse its arguments, the parent
/// missing the announcement, or `is_running()` staying true after the child exits.
#[tokio::test]
async fn given_started_time_server_when_stopped_gracefully_then_exits_and_is_reaped() {
    // GIVEN: A time server started on an OS-assigned port
    let scratch = TempDir::new().unwrap();
    let server = process(ServerKind::Time, scratch.path());
    let addr = server.start("127.0.0.1", 0).await.unwrap();

    // THEN: It is running in another process and serves requests
    assert!(server.is_running());
    assert_ne!(server.pid(), Some(std::process::id()));
    let mut client = Client::connect(addr).await;
    let reply = client.request("timezone:utc").await.unwrap();
    assert!(reply.starts_with("200 "), "{reply}");
    drop(client);

    // WHEN: Stopping gracefully
    server.stop(false).unwrap();

    // THEN: The child exits and the handle clears
    timeout(EXIT_TIMEOUT, server.wait()).await.unwrap();
    assert!(!server.is_running());
    assert_eq!(server.pid(), None);

    // AND: Its log file was written
    let log = std::fs::read_to_string(scratch.path().join("logs").join("time_server.log")).unwrap();
    assert!(log.contains("Main server will terminate now"), "{log}");
}

#[tokio::test]
async fn given_running_server_when_started_again_then_no_op_with_same_address() {
    let scratch = TempDir::new().unwrap();
    let server = process(ServerKind::Time, scratch.path());
    let first = server.start("127.0.0.1", 0).await.unwrap();
    let pid = server.pid();

    let second = server.start("127.0.0.1", 0).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(server.pid(), pid);
    server.stop(true).unwrap();
    timeout(EXIT_TIMEOUT, server.wait()).await.unwrap();
}

/// **VALUE**: A graceful stop lets a connected client finish before the process exits.
///
/// **WHY THIS MATTERS**: Sensors in the middle of a reading must not lose it because an
/// operator pressed Ctrl-C once.
///
/// **BUG THIS CATCHES**: Would catch SIGTERM being treated as a kill, or the drain never
/// completing after the last client leaves.
#[tokio::test]
async fn given_connected_client_when_stopped_gracefully_then_waits_for_client() {
    // GIVEN: A data server with a connected client
    let scratch = TempDir::new().unwrap();
    let server = process(ServerKind::Data, scratch.path());
    let addr = server.start("127.0.0.1", 0).await.unwrap();
    let mut client = Client::connect(addr).await;
    assert_eq!(client.request("temp:20").await.as_deref(), Some("200"));

    // WHEN: Stopping gracefully
    server.stop(false).unwrap();
    sleep(Duration::from_millis(300)).await;

    // THEN: The process keeps serving the existing client and refuses new ones
    assert!(server.is_running());
    assert_eq!(client.request("temp:21").await.as_deref(), Some("200"));
    assert!(TcpStream::connect(addr).await.is_err());

    // WHEN: The client leaves
    drop(client);

    // THEN: The process exits and both readings were stored
    timeout(EXIT_TIMEOUT, server.wait()).await.unwrap();
    assert!(!server.is_running());
    let rows = std::fs::read_to_string(scratch.path().join("data").join("data.csv")).unwrap();
    assert_eq!(rows, "20\n21\n");
}

/// **VALUE**: A kill stop terminates promptly even with clients connected.
///
/// **BUG THIS CATCHES**: Would catch SIGUSR1 being ignored, or the child waiting on its
/// connection workers before exiting.
#[tokio::test]
async fn given_connected_client_when_killed_then_exits_promptly_and_client_disconnected() {
    // GIVEN: A log server with a connected client
    let scratch = TempDir::new().unwrap();
    let server = process(ServerKind::Log, scratch.path());
    let addr = server.start("127.0.0.1", 0).await.unwrap();
    let mut client = Client::connect(addr).await;
    assert_eq!(client.request("hello").await.as_deref(), Some("200"));

    // WHEN: Killing
    server.stop(true).unwrap();

    // THEN: The process exits without waiting for the client, which sees the connection end
    timeout(Duration::from_secs(5), server.wait()).await.unwrap();
    assert!(!server.is_running());
    assert_eq!(client.reply().await, None);
}

#[tokio::test]
async fn given_stopped_server_when_stopped_again_then_no_op() {
    let scratch = TempDir::new().unwrap();
    let server = process(ServerKind::Time, scratch.path());
    server.start("127.0.0.1", 0).await.unwrap();
    assert!(
        server
            .stop_and_wait(false, Duration::from_secs(5))
            .await
            .unwrap()
    );

    assert!(server.stop(false).is_ok());
    assert!(server.stop(true).is_ok());
    assert!(!server.is_running());
}

#[tokio::test]
async fn given_port_in_use_when_started_then_startup_error() {
    // GIVEN: A port held by another listener
    let scratch = TempDir::new().unwrap();
    let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = holder.local_addr().unwrap().port();
    let server = process(ServerKind::Time, scratch.path());

    // WHEN: Starting on it
    let result = server.start("127.0.0.1", port).await;

    // THEN: Startup fails and nothing is left running
    assert!(result.is_err());
    assert!(!server.is_running());
}
