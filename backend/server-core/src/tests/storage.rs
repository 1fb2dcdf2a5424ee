use crate::storage::{
    DATA_FILE, HEADER_FILE, LOG_FILE, append_log_line, append_row, read_header, write_header,
};

use std::fs;

use tempfile::TempDir;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn given_no_header_file_when_read_then_creates_empty_header() {
    // GIVEN: An empty directory
    let dir = TempDir::new().unwrap();

    // WHEN: Reading the header
    let header = read_header(dir.path()).unwrap();

    // THEN: The header is empty and the file now exists with a single newline
    assert!(header.is_empty());
    assert_eq!(fs::read_to_string(dir.path().join(HEADER_FILE)).unwrap(), "\n");
}

#[test]
fn given_written_header_when_read_then_returns_columns() {
    // GIVEN: A written header
    let dir = TempDir::new().unwrap();
    write_header(dir.path(), &strings(&["temp", "humidity"])).unwrap();

    // WHEN: Reading it back
    let header = read_header(dir.path()).unwrap();

    // THEN: Columns match
    assert_eq!(header, strings(&["temp", "humidity"]));
}

#[test]
fn given_rows_when_appended_then_each_is_one_line() {
    // GIVEN: A data directory
    let dir = TempDir::new().unwrap();

    // WHEN: Appending two rows, one with a blank column
    append_row(dir.path(), &strings(&["21.5", "40"])).unwrap();
    append_row(dir.path(), &strings(&["22", ""])).unwrap();

    // THEN: The file holds both rows in order
    assert_eq!(
        fs::read_to_string(dir.path().join(DATA_FILE)).unwrap(),
        "21.5,40\n22,\n"
    );
}

#[test]
fn given_log_lines_when_appended_then_file_grows() {
    let dir = TempDir::new().unwrap();

    append_log_line(dir.path(), "first").unwrap();
    append_log_line(dir.path(), "second").unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join(LOG_FILE)).unwrap(),
        "first\nsecond\n"
    );
}

/// **VALUE**: Write failures surface as errors instead of panics.
///
/// **WHY THIS MATTERS**: Handlers translate storage errors into `500`. A panic would take
/// down the worker task and the client would see a dropped connection instead.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap()` on file IO in the writers.
#[test]
fn given_missing_directory_when_appending_then_returns_error() {
    // GIVEN: A directory path that does not exist
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    // WHEN: Appending
    let result = append_row(&missing, &strings(&["1"]));

    // THEN: An error mentioning the path is returned
    let error = result.unwrap_err();
    assert!(error.to_string().contains("does-not-exist"));
}
