use crate::helpers::{Client, echo_handler, start_server, time_spec};

use server_core::{ShutdownMode, ShutdownOutcome};

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

// ============================================================================
// Drain and kill, driven in-process through the shutdown controller
// ============================================================================

/// **VALUE**: Draining an idle server returns at once and stops accepting.
///
/// **BUG THIS CATCHES**: Would catch a drain that waits for a connection that never comes,
/// or a listener kept open after shutdown was requested.
#[tokio::test]
async fn given_no_connections_when_drain_requested_then_returns_drained_and_refuses_new() {
    // GIVEN: An idle server
    let server = start_server(time_spec(2, Duration::from_secs(30)), echo_handler()).await;

    // WHEN: Drain is requested
    server.controller.request(ShutdownMode::Drain);

    // THEN: The run finishes as drained and the port refuses connections
    let outcome = timeout(Duration::from_secs(2), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Drained);
    assert!(TcpStream::connect(server.addr).await.is_err());
}

/// **VALUE**: During a drain, live connections keep being served and the run ends only when
/// the last one leaves.
///
/// **WHY THIS MATTERS**: This is the graceful-stop contract: no in-flight client loses data,
/// and the process does not linger after the last client goes away.
///
/// **BUG THIS CATCHES**: Would catch a drain that exits with connections still open, or one
/// that never notices the last slot being released.
#[tokio::test]
async fn given_active_connection_when_drain_requested_then_waits_for_it_to_finish() {
    // GIVEN: A server with one connected client
    let server = start_server(time_spec(2, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;
    assert!(client.request("before").await.is_some());

    // WHEN: Drain is requested
    server.controller.request(ShutdownMode::Drain);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // THEN: New connections are refused, the existing client is still served
    assert!(TcpStream::connect(server.addr).await.is_err());
    assert_eq!(client.request("during").await.as_deref(), Some("200 echo during"));
    assert!(!server.task.is_finished());

    // WHEN: The client leaves
    drop(client);

    // THEN: The run completes as drained
    let outcome = timeout(Duration::from_secs(2), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Drained);
}

/// **VALUE**: Kill closes live connections immediately.
///
/// **BUG THIS CATCHES**: Would catch kill behaving like drain (waiting on clients), or
/// `close_all` not reaching workers that are parked in the readiness wait.
#[tokio::test]
async fn given_active_connections_when_kill_requested_then_closes_them_and_returns() {
    // GIVEN: Two connected clients
    let server = start_server(time_spec(3, Duration::from_secs(30)), echo_handler()).await;
    let mut first = Client::connect(server.addr).await;
    let mut second = Client::connect(server.addr).await;
    assert!(first.request("a").await.is_some());
    assert!(second.request("b").await.is_some());

    // WHEN: Kill is requested
    server.controller.request(ShutdownMode::Kill);

    // THEN: The run returns killed and both clients see their connection end
    let outcome = timeout(Duration::from_secs(2), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Killed { closed: 2 });
    assert_eq!(first.reply().await, None);
    assert_eq!(second.reply().await, None);
}

#[tokio::test]
async fn given_drain_in_progress_when_kill_requested_then_escalates() {
    // GIVEN: A drain blocked on one live client
    let server = start_server(time_spec(1, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;
    assert!(client.request("x").await.is_some());
    server.controller.request(ShutdownMode::Drain);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.task.is_finished());

    // WHEN: Kill follows
    server.controller.request(ShutdownMode::Kill);

    // THEN: The run returns killed and the client is disconnected
    let outcome = timeout(Duration::from_secs(2), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Killed { closed: 1 });
    assert_eq!(client.reply().await, None);
}

#[tokio::test]
async fn given_full_pool_when_drain_requested_then_admission_wait_ends() {
    // GIVEN: A one-slot server that is full
    let server = start_server(time_spec(1, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;
    assert!(client.request("hold").await.is_some());

    // WHEN: Drain is requested while the accept loop waits for a slot, then the client leaves
    server.controller.request(ShutdownMode::Drain);
    drop(client);

    // THEN: The run completes
    let outcome = timeout(Duration::from_secs(3), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Drained);
}
