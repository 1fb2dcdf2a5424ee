use crate::helpers::{Client, start_server};

use server_core::ShutdownMode;
use server_core::handlers::build_handler;
use server_core::storage::{DATA_FILE, HEADER_FILE, LOG_FILE};

use models::{ServerKind, ServerSpecBuilder};

use std::fs;

use tempfile::TempDir;

// ============================================================================
// Concrete handlers served over TCP
// ============================================================================

#[tokio::test]
async fn given_data_server_when_readings_sent_then_csv_files_written() {
    // GIVEN: A data server on a scratch directory
    let dir = TempDir::new().unwrap();
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Data)
        .with_storage_dir(dir.path())
        .build()
        .unwrap();
    let handler = build_handler(&spec).unwrap();
    let server = start_server(spec, handler).await;
    let mut client = Client::connect(server.addr).await;

    // WHEN: Sending readings, one of them malformed
    let first = client.request("temp:21.5,humidity:40").await;
    let second = client.request("temp:22").await;
    let third = client.request("not-a-valid-pair").await;

    // THEN: Status codes and files match
    assert_eq!(first.as_deref(), Some("200"));
    assert_eq!(second.as_deref(), Some("200"));
    assert_eq!(third.as_deref(), Some("400"));
    assert_eq!(
        fs::read_to_string(dir.path().join(HEADER_FILE)).unwrap(),
        "temp,humidity\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join(DATA_FILE)).unwrap(),
        "21.5,40\n22,\n"
    );

    server.controller.request(ShutdownMode::Kill);
}

/// **VALUE**: A malformed request is answered with `400` every time and the connection stays usable.
///
/// **WHY THIS MATTERS**: Sensors retry on failure. If a bad line closed the connection or
/// left partial state behind, the retry and every later reading would be lost.
///
/// **BUG THIS CATCHES**: Would catch the worker treating a `400` as fatal, or the data handler
/// touching `header.csv`/`data.csv` before the pairs were fully parsed.
#[tokio::test]
async fn given_repeated_malformed_line_when_sent_then_400_each_time_and_connection_stays_open() {
    // GIVEN: A data server on a scratch directory
    let dir = TempDir::new().unwrap();
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Data)
        .with_storage_dir(dir.path())
        .build()
        .unwrap();
    let handler = build_handler(&spec).unwrap();
    let server = start_server(spec, handler).await;
    let mut client = Client::connect(server.addr).await;

    // WHEN: Sending the same malformed line twice, then a valid reading, on one connection
    let first = client.request("not-a-valid-pair").await;
    let second = client.request("not-a-valid-pair").await;
    assert!(!dir.path().join(DATA_FILE).exists());
    let third = client.request("temp:1").await;

    // THEN: 400, 400, 200 and only the valid reading reached the files
    assert_eq!(first.as_deref(), Some("400"));
    assert_eq!(second.as_deref(), Some("400"));
    assert_eq!(third.as_deref(), Some("200"));
    assert_eq!(
        fs::read_to_string(dir.path().join(HEADER_FILE)).unwrap(),
        "temp\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join(DATA_FILE)).unwrap(),
        "1\n"
    );

    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_log_server_when_lines_sent_then_appended() {
    let dir = TempDir::new().unwrap();
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Log)
        .with_storage_dir(dir.path().join("log_data"))
        .build()
        .unwrap();
    let handler = build_handler(&spec).unwrap();
    let server = start_server(spec, handler).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.request("boot ok").await.as_deref(), Some("200"));

    assert_eq!(
        fs::read_to_string(dir.path().join("log_data").join(LOG_FILE)).unwrap(),
        "boot ok\n"
    );
    server.controller.request(ShutdownMode::Kill);
}

#[tokio::test]
async fn given_time_server_when_queried_then_status_and_seconds() {
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .build()
        .unwrap();
    let handler = build_handler(&spec).unwrap();
    let server = start_server(spec, handler).await;
    let mut client = Client::connect(server.addr).await;

    let ok = client.request("timezone:utc,offset_seconds:3600").await.unwrap();
    let bad = client.request("timezone:mars").await;

    let (status, seconds) = ok.split_once(' ').unwrap();
    assert_eq!(status, "200");
    assert!(seconds.parse::<f64>().unwrap() > 3600.0);
    assert_eq!(bad.as_deref(), Some("400"));
    server.controller.request(ShutdownMode::Kill);
}
