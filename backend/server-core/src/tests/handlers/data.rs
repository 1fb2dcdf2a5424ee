use crate::handler::RequestHandler;
use crate::handlers::DataHandler;
use crate::storage::{DATA_FILE, HEADER_FILE, write_header};

use std::fs;

use tempfile::TempDir;

fn read(dir: &TempDir, file: &str) -> String {
    fs::read_to_string(dir.path().join(file)).unwrap_or_default()
}

/// **VALUE**: The first reading defines the header in request order.
///
/// **BUG THIS CATCHES**: Would catch new keys being sorted or inserted in hash order, which
/// scrambles the CSV columns relative to the sender's intent.
#[test]
fn given_empty_header_when_reading_received_then_header_and_row_written() {
    // GIVEN: A fresh data directory
    let dir = TempDir::new().unwrap();
    let handler = DataHandler::new(dir.path()).unwrap();

    // WHEN: Receiving a reading
    let response = handler.receive("temp:21.5,humidity:40");

    // THEN: 200, header and row written
    assert_eq!(response.to_string(), "200");
    assert_eq!(read(&dir, HEADER_FILE), "temp,humidity\n");
    assert_eq!(read(&dir, DATA_FILE), "21.5,40\n");
    assert_eq!(handler.header(), vec!["temp", "humidity"]);
}

#[test]
fn given_existing_header_when_partial_reading_received_then_blank_columns() {
    // GIVEN: A header already on disk
    let dir = TempDir::new().unwrap();
    write_header(dir.path(), &["temp".to_string(), "humidity".to_string()]).unwrap();
    let handler = DataHandler::new(dir.path()).unwrap();

    // WHEN: Receiving only one of the columns
    let response = handler.receive("temp:22");

    // THEN: The missing column is blank
    assert_eq!(response.to_string(), "200");
    assert_eq!(read(&dir, DATA_FILE), "22,\n");
    assert_eq!(read(&dir, HEADER_FILE), "temp,humidity\n");
}

#[test]
fn given_new_key_when_reading_received_then_header_extended_at_end() {
    // GIVEN: A handler that has seen `temp`
    let dir = TempDir::new().unwrap();
    let handler = DataHandler::new(dir.path()).unwrap();
    handler.receive("temp:20");

    // WHEN: A reading introduces `pressure` before `temp`
    let response = handler.receive("pressure:1013,temp:21");

    // THEN: `pressure` is appended after existing columns and the row follows the header
    assert_eq!(response.to_string(), "200");
    assert_eq!(read(&dir, HEADER_FILE), "temp,pressure\n");
    assert_eq!(read(&dir, DATA_FILE), "20\n21,1013\n");
}

/// **VALUE**: Malformed input is a `400` and leaves storage untouched.
///
/// **WHY THIS MATTERS**: A half-applied bad request would extend the header with garbage keys
/// that persist in every future row.
///
/// **BUG THIS CATCHES**: Would catch header mutation happening before parsing succeeds.
#[test]
fn given_malformed_request_when_received_then_bad_request_and_no_mutation() {
    // GIVEN: A fresh handler
    let dir = TempDir::new().unwrap();
    let handler = DataHandler::new(dir.path()).unwrap();

    // WHEN: Receiving an invalid pair
    let response = handler.receive("not-a-valid-pair");

    // THEN: 400 and no data written
    assert_eq!(response.to_string(), "400");
    assert_eq!(read(&dir, HEADER_FILE), "\n");
    assert!(!dir.path().join(DATA_FILE).exists());
}

#[test]
fn given_storage_removed_when_reading_received_then_internal_error() {
    // GIVEN: A handler whose directory disappears
    let root = TempDir::new().unwrap();
    let data_dir = root.path().join("sensor");
    let handler = DataHandler::new(&data_dir).unwrap();
    fs::remove_dir_all(&data_dir).unwrap();

    // WHEN: Receiving a valid reading
    let response = handler.receive("temp:1");

    // THEN: 500
    assert_eq!(response.to_string(), "500");
}
