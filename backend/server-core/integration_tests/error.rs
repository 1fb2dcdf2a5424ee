use server_core::CoreError;
use server_core::error::storage::StorageError;
use server_core::handlers::build_handler;

use models::{ServerKind, ServerSpec, TextEncoding};

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

// ============================================================================
// Error construction and display from a consumer's point of view
// ============================================================================

#[test]
fn given_data_spec_without_storage_when_building_handler_then_not_configured() {
    // GIVEN: A hand-built spec that skipped builder validation
    let spec = ServerSpec {
        kind: ServerKind::Data,
        name: "data_server".to_string(),
        timeout: Duration::from_secs(30),
        max_conn: 1,
        encoding: TextEncoding::Utf8,
        storage_dir: None,
        logs_dir: PathBuf::from("logs"),
        log_console: false,
        debug: false,
    };

    // WHEN: Building the handler
    let result = build_handler(&spec);

    // THEN: A storage configuration error naming the server
    match result {
        Err(StorageError::NotConfigured { message, .. }) => {
            assert!(message.contains("data_server"))
        }
        Err(other) => panic!("Unexpected error: {other}"),
        Ok(_) => panic!("Expected an error"),
    }
}

/// **VALUE**: Errors carry the source location of the failing call.
///
/// **WHY THIS MATTERS**: Server logs are the only diagnostics a deployed station has. The
/// `[file:line:column]` suffix points straight at the failing operation.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` chain that makes every error
/// point at the same helper line.
#[test]
fn given_storage_failure_when_displayed_then_includes_kind_path_and_location() {
    // GIVEN: A file where a directory is expected
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, "").unwrap();

    // WHEN: Appending under it
    let error = server_core::storage::append_log_line(&blocker, "x").unwrap_err();
    let core: CoreError = error.into();
    let display = core.to_string();

    // THEN: Kind, path and location are all present
    assert!(display.starts_with("Storage IO Error:"), "{display}");
    assert!(display.contains("blocked"), "{display}");
    assert!(display.contains(".rs:"), "{display}");
}
