use crate::{ModelError, ServerKind, ServerSpecBuilder, TextEncoding};

use std::path::PathBuf;
use std::time::Duration;

/// **VALUE**: Verifies that the builder fills in the documented defaults.
///
/// **WHY THIS MATTERS**: The CLI only overrides a few fields; everything else relies on
/// these defaults matching the deployed configuration (30 s timeout, 10 slots, UTF-8).
///
/// **BUG THIS CATCHES**: Would catch a default drifting (e.g. `max_conn` falling back to 0,
/// which would make every server refuse all connections forever).
#[test]
fn given_only_kind_when_building_time_spec_then_uses_defaults() {
    // GIVEN: Builder with only the kind set
    let builder = ServerSpecBuilder::default().with_kind(ServerKind::Time);

    // WHEN: Building
    let spec = builder.build().expect("time spec needs no storage");

    // THEN: Defaults are applied
    assert_eq!(spec.name, "time_server");
    assert_eq!(spec.timeout, Duration::from_secs(30));
    assert_eq!(spec.max_conn, 10);
    assert_eq!(spec.encoding, TextEncoding::Utf8);
    assert_eq!(spec.storage_dir, None);
    assert_eq!(spec.log_file(), PathBuf::from("logs/time_server.log"));
}

#[test]
fn given_missing_kind_when_building_then_returns_validation_error() {
    let result = ServerSpecBuilder::default().with_name("anything").build();

    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Server kind is required");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: A zero-slot server would never accept anything.
///
/// **BUG THIS CATCHES**: Would catch removal of the `max_conn >= 1` guard; the accept
/// loop would then wait for a free slot forever.
#[test]
fn given_zero_max_conn_when_building_then_returns_validation_error() {
    let result = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .with_max_conn(0)
        .build();

    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "max_conn must be at least 1");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn given_zero_timeout_when_building_then_returns_validation_error() {
    let result = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .with_timeout(Duration::ZERO)
        .build();

    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

#[test]
fn given_blank_name_when_building_then_returns_validation_error() {
    let result = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .with_name("   ")
        .build();

    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Data and log servers persist every request; without a directory they
/// would fail every request with `500`.
#[test]
fn given_data_kind_without_storage_when_building_then_returns_validation_error() {
    let result = ServerSpecBuilder::default()
        .with_kind(ServerKind::Data)
        .build();

    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert!(message.contains("data"), "Message should name the kind: {message}");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn given_full_configuration_when_building_then_keeps_every_field() {
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Log)
        .with_name("edge_logs")
        .with_timeout(Duration::from_secs(5))
        .with_max_conn(3)
        .with_encoding(TextEncoding::Ascii)
        .with_storage_dir("/var/lib/station/logs")
        .with_logs_dir("/var/log/station")
        .with_log_console(true)
        .with_debug(true)
        .build()
        .unwrap();

    assert_eq!(spec.kind, ServerKind::Log);
    assert_eq!(spec.name, "edge_logs");
    assert_eq!(spec.max_conn, 3);
    assert_eq!(spec.encoding, TextEncoding::Ascii);
    assert_eq!(
        spec.storage_dir,
        Some(PathBuf::from("/var/lib/station/logs"))
    );
    assert!(spec.log_console);
    assert!(spec.debug);
    assert_eq!(spec.log_file(), PathBuf::from("/var/log/station/edge_logs.log"));
}
