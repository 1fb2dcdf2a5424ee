use crate::handler::RequestHandler;
use crate::handlers::LogHandler;
use crate::storage::LOG_FILE;

use std::fs;

use tempfile::TempDir;

#[test]
fn given_missing_directory_when_constructed_then_creates_it() {
    let root = TempDir::new().unwrap();
    let log_dir = root.path().join("log_data");

    LogHandler::new(&log_dir).unwrap();

    assert!(log_dir.is_dir());
}

#[test]
fn given_any_text_when_received_then_appended_verbatim() {
    // GIVEN: A log handler
    let dir = TempDir::new().unwrap();
    let handler = LogHandler::new(dir.path()).unwrap();

    // WHEN: Receiving text that would not parse as pairs
    let first = handler.receive("sensor 3 rebooted");
    let second = handler.receive("a:b:c");

    // THEN: Both are accepted and stored line by line
    assert_eq!(first.to_string(), "200");
    assert_eq!(second.to_string(), "200");
    assert_eq!(
        fs::read_to_string(dir.path().join(LOG_FILE)).unwrap(),
        "sensor 3 rebooted\na:b:c\n"
    );
}

#[test]
fn given_directory_removed_when_received_then_internal_error() {
    let root = TempDir::new().unwrap();
    let log_dir = root.path().join("log_data");
    let handler = LogHandler::new(&log_dir).unwrap();
    fs::remove_dir_all(&log_dir).unwrap();

    assert_eq!(handler.receive("lost").to_string(), "500");
}
