use crate::helpers::{Client, echo_handler, eventually, start_server, time_spec};

use server_core::error::server::ServerError;
use server_core::{Server, ShutdownMode, ShutdownOutcome};

use std::time::Duration;

use tokio::net::TcpStream;

// ============================================================================
// Transport loop: binding, accepting, admission control
// ============================================================================

/// **VALUE**: A full request/response cycle over a real socket.
///
/// **WHY THIS MATTERS**: This is the whole wire contract: one line in, one status line out,
/// connection kept open for the next request.
///
/// **BUG THIS CATCHES**: Would catch responses missing the trailing newline (clients reading
/// by line would hang) or the worker closing after a single request.
#[tokio::test]
async fn given_running_server_when_requests_sent_then_each_gets_a_response_line() {
    // GIVEN: A server with an echo handler
    let server = start_server(time_spec(2, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;

    // WHEN: Sending two requests on the same connection
    let first = client.request("ping").await;
    let second = client.request("pong").await;

    // THEN: Both are answered in order
    assert_eq!(first.as_deref(), Some("200 echo ping"));
    assert_eq!(second.as_deref(), Some("200 echo pong"));

    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_port_zero_when_bound_then_reports_assigned_port() {
    let server = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "127.0.0.1",
        0,
    )
    .await
    .unwrap();

    assert_ne!(server.local_addr().port(), 0);
    assert!(TcpStream::connect(server.local_addr()).await.is_ok());
}

#[tokio::test]
async fn given_port_in_use_when_bound_then_bind_error() {
    // GIVEN: A server already listening
    let first = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "127.0.0.1",
        0,
    )
    .await
    .unwrap();

    // WHEN: Binding the same port again
    let second = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "127.0.0.1",
        first.local_addr().port(),
    )
    .await;

    // THEN: Bind fails with a bind error naming the address
    match second {
        Err(ServerError::Bind { message, .. }) => {
            assert!(message.contains(&first.local_addr().port().to_string()))
        }
        Err(other) => panic!("Expected bind error, got {other}"),
        Ok(_) => panic!("Expected bind error, got a server"),
    }
}

#[tokio::test]
async fn given_unresolvable_host_when_bound_then_resolve_error() {
    let result = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "no such host",
        0,
    )
    .await;

    assert!(matches!(result, Err(ServerError::Resolve { .. })));
}

/// **VALUE**: Bind-time errors point at the operation that failed.
///
/// **WHY THIS MATTERS**: A child that fails to start only leaves its log line behind. The
/// `[file:line:column]` suffix must tell resolution failures apart from socket failures.
///
/// **BUG THIS CATCHES**: Would catch the location being captured once at the top of the async
/// `bind`, which stamps every failure with the same line.
#[tokio::test]
async fn given_resolve_and_bind_failures_when_inspected_then_locations_differ() {
    // GIVEN: A server holding a port
    let first = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "127.0.0.1",
        0,
    )
    .await
    .unwrap();

    // WHEN: Failing once on resolution and once on the socket
    let resolve = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "no such host",
        0,
    )
    .await;
    let bind = Server::bind(
        time_spec(1, Duration::from_secs(30)),
        echo_handler(),
        "127.0.0.1",
        first.local_addr().port(),
    )
    .await;

    // THEN: Both are located in the transport module, on different lines
    let resolve_location = match resolve {
        Err(ServerError::Resolve { location, .. }) => location,
        Err(other) => panic!("Expected resolve error, got {other}"),
        Ok(_) => panic!("Expected resolve error, got a server"),
    };
    let bind_location = match bind {
        Err(ServerError::Bind { location, .. }) => location,
        Err(other) => panic!("Expected bind error, got {other}"),
        Ok(_) => panic!("Expected bind error, got a server"),
    };
    assert!(resolve_location.file.ends_with("transport.rs"), "{resolve_location}");
    assert!(bind_location.file.ends_with("transport.rs"), "{bind_location}");
    assert_ne!(resolve_location.line, bind_location.line);
}

/// **VALUE**: With every slot taken, connection N+1 is not served until a slot frees.
///
/// **WHY THIS MATTERS**: `max_conn` is the only backpressure the server has. Serving an
/// extra connection would exceed the configured concurrency limit.
///
/// **BUG THIS CATCHES**: Would catch the accept loop skipping the admission wait, or a
/// release that does not wake the waiting accept loop.
#[tokio::test]
async fn given_full_pool_when_extra_client_connects_then_served_only_after_a_release() {
    // GIVEN: A two-slot server with both slots in use
    let server = start_server(time_spec(2, Duration::from_secs(30)), echo_handler()).await;
    let mut first = Client::connect(server.addr).await;
    let mut second = Client::connect(server.addr).await;
    assert!(first.request("a").await.is_some());
    assert!(second.request("b").await.is_some());
    assert_eq!(server.pool.active_count(), 2);

    // WHEN: A third client connects and sends
    let mut third = Client::connect(server.addr).await;
    third.send(b"c\n").await;

    // THEN: It gets no reply while the pool is full
    assert!(!third.replies_within(Duration::from_millis(500)).await);
    assert_eq!(server.pool.active_count(), 2);

    // WHEN: The first client leaves
    drop(first);

    // THEN: The third client is admitted and served, never exceeding capacity
    assert_eq!(third.reply().await.as_deref(), Some("200 echo c"));
    assert!(server.pool.active_count() <= 2);

    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_client_disconnects_when_worker_ends_then_slot_released() {
    // GIVEN: A connected client
    let server = start_server(time_spec(1, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;
    assert!(client.request("hello").await.is_some());
    assert_eq!(server.pool.active_count(), 1);

    // WHEN: It disconnects
    drop(client);

    // THEN: The slot is freed
    let pool = server.pool.clone();
    assert!(eventually(Duration::from_secs(2), || pool.active_count() == 0).await);

    server.controller.request(ShutdownMode::Drain);
    let outcome = server.task.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownOutcome::Drained);
}
