use crate::helpers::{Client, echo_handler, eventually, start_server, time_spec};

use server_core::{RequestHandler, Response, ShutdownMode};

use models::{ServerKind, ServerSpecBuilder, TextEncoding};

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ============================================================================
// Connection worker: decoding, trimming, handler dispatch, termination
// ============================================================================

/// **VALUE**: Trailing whitespace (including CR/LF) is stripped before the handler sees it.
///
/// **BUG THIS CATCHES**: Would catch a data handler receiving `40\r` as the last value and
/// persisting the carriage return into the CSV.
#[tokio::test]
async fn given_request_with_trailing_whitespace_when_received_then_handler_sees_trimmed_text() {
    // GIVEN: A handler that records what it receives
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        move |request: &str| {
            seen.lock().unwrap().push(request.to_string());
            Response::ok()
        }
    };
    let server = start_server(time_spec(1, Duration::from_secs(30)), Arc::new(recorder)).await;
    let mut client = Client::connect(server.addr).await;

    // WHEN: Sending text with trailing spaces and CRLF
    client.send(b"  temp:1 \t\r\n").await;
    let reply = client.reply().await;

    // THEN: Only trailing whitespace is removed
    assert_eq!(reply.as_deref(), Some("200"));
    assert_eq!(seen.lock().unwrap().as_slice(), ["  temp:1"]);

    server.controller.request(ShutdownMode::Kill);
}

/// **VALUE**: Undecodable bytes close the connection without any response.
///
/// **WHY THIS MATTERS**: The wire has no error frame for encoding problems. Replying with a
/// status would suggest the request was understood.
///
/// **BUG THIS CATCHES**: Would catch lossy decoding (replacement characters) sneaking garbage
/// into the handler, or a worker that keeps the connection open after a decode failure.
#[tokio::test]
async fn given_invalid_utf8_when_received_then_connection_closed_without_reply() {
    // GIVEN: A UTF-8 server
    let server = start_server(time_spec(1, Duration::from_secs(30)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;

    // WHEN: Sending invalid UTF-8
    client.send(&[0xff, 0xfe, b'\n']).await;

    // THEN: The server closes the connection and frees the slot
    assert_eq!(client.reply().await, None);
    let pool = server.pool.clone();
    assert!(eventually(Duration::from_secs(2), || pool.active_count() == 0).await);

    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_ascii_server_when_non_ascii_received_then_connection_closed() {
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .with_encoding(TextEncoding::Ascii)
        .build()
        .unwrap();
    let server = crate::helpers::start_server(spec, echo_handler()).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.request("plain").await.as_deref(), Some("200 echo plain"));
    client.send("température\n".as_bytes()).await;

    assert_eq!(client.reply().await, None);
    server.controller.request(ShutdownMode::Kill);
}

/// **VALUE**: A connection with no traffic for the idle timeout is closed.
///
/// **WHY THIS MATTERS**: Idle clients hold slots. Without the timeout a handful of dead peers
/// exhaust `max_conn` and the server stops serving anyone.
///
/// **BUG THIS CATCHES**: Would catch the readiness loop re-arming forever without checking
/// the elapsed idle time.
#[tokio::test]
async fn given_idle_client_when_timeout_elapses_then_connection_closed() {
    // GIVEN: A server with a one second idle timeout
    let server = start_server(time_spec(1, Duration::from_secs(1)), echo_handler()).await;
    let mut client = Client::connect(server.addr).await;
    assert!(client.request("hi").await.is_some());
    let started = Instant::now();

    // WHEN: The client stays silent
    let reply = client.reply().await;

    // THEN: The server closes the connection after roughly the timeout
    assert_eq!(reply, None);
    assert!(started.elapsed() >= Duration::from_millis(900));
    let pool = server.pool.clone();
    assert!(eventually(Duration::from_secs(2), || pool.active_count() == 0).await);

    server.controller.request(ShutdownMode::Kill);
}

/// **VALUE**: A slow handler only blocks its own connection.
///
/// **BUG THIS CATCHES**: Would catch the handler running directly on the async worker thread
/// of a single-threaded section, starving other connections.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_slow_request_when_other_client_sends_then_other_client_served_first() {
    // GIVEN: A handler that sleeps on "slow"
    let handler = |request: &str| {
        if request == "slow" {
            std::thread::sleep(Duration::from_millis(800));
        }
        Response::ok_with(request.to_string())
    };
    let server = start_server(time_spec(2, Duration::from_secs(30)), Arc::new(handler)).await;
    let mut slow = Client::connect(server.addr).await;
    let mut fast = Client::connect(server.addr).await;

    // WHEN: The slow request is in flight and a fast one follows
    slow.send(b"slow\n").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let started = Instant::now();
    let fast_reply = fast.request("fast").await;

    // THEN: The fast client is answered well before the slow handler finishes
    assert_eq!(fast_reply.as_deref(), Some("200 fast"));
    assert!(started.elapsed() < Duration::from_millis(600));
    assert_eq!(slow.reply().await.as_deref(), Some("200 slow"));

    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_panicking_handler_when_request_sent_then_internal_error() {
    struct Exploding;
    impl RequestHandler for Exploding {
        fn receive(&self, _request: &str) -> Response {
            panic!("handler bug");
        }
    }

    let server = start_server(time_spec(1, Duration::from_secs(30)), Arc::new(Exploding)).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.request("boom").await.as_deref(), Some("500"));
    server.controller.request(ShutdownMode::Kill);
}
