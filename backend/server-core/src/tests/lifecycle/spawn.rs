// Unit tests for spawn module private functions

use crate::lifecycle::spawn::{
    LISTENING_MARKER, SERVE_COMMAND, build_serve_command, get_listening_regex,
};

use models::{ServerKind, ServerSpecBuilder};

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

fn args_of(cmd: &tokio::process::Command) -> Vec<String> {
    cmd.as_std()
        .get_args()
        .map(|a: &OsStr| a.to_string_lossy().to_string())
        .collect()
}

/// **VALUE**: The child command line carries every field of the spec.
///
/// **WHY THIS MATTERS**: The child rebuilds its spec purely from these arguments. A dropped
/// flag silently runs the child with defaults (wrong slot count, wrong storage directory).
///
/// **BUG THIS CATCHES**: Would catch a refactor that forgets `--storage-dir` or `--max-conn`.
#[test]
fn given_data_spec_when_building_serve_command_then_passes_all_fields() {
    // GIVEN: A data server spec
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Data)
        .with_max_conn(3)
        .with_timeout(Duration::from_secs(12))
        .with_storage_dir("/tmp/sensor")
        .with_logs_dir("/tmp/logs")
        .with_debug(true)
        .build()
        .unwrap();

    // WHEN: Building the command
    let cmd = build_serve_command(Path::new("/usr/bin/station"), &spec, "127.0.0.1", 0);

    // THEN: Program and arguments match
    assert_eq!(cmd.as_std().get_program(), "/usr/bin/station");
    let args = args_of(&cmd);
    assert_eq!(args[0], SERVE_COMMAND);
    let joined = args.join(" ");
    for expected in [
        "--kind data",
        "--name data_server",
        "--host 127.0.0.1",
        "--port 0",
        "--timeout 12",
        "--max-conn 3",
        "--encoding utf-8",
        "--storage-dir /tmp/sensor",
        "--logs-dir /tmp/logs",
        "--debug",
    ] {
        assert!(joined.contains(expected), "Missing '{expected}' in: {joined}");
    }
    assert!(!args.iter().any(|a| a == "--log-console"));
}

#[test]
fn given_time_spec_when_building_serve_command_then_omits_storage_dir() {
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .build()
        .unwrap();

    let cmd = build_serve_command(Path::new("station"), &spec, "localhost", 13001);

    assert!(!args_of(&cmd).iter().any(|a| a == "--storage-dir"));
}

#[test]
fn given_announcement_line_when_regex_applied_then_extracts_address() {
    // GIVEN: The line a child prints once listening
    let line = format!("{LISTENING_MARKER}127.0.0.1:41234");

    // WHEN: Applying the regex
    let caps = get_listening_regex().captures(&line).unwrap();

    // THEN: The address is captured
    assert_eq!(caps.name("addr").unwrap().as_str(), "127.0.0.1:41234");
}

#[test]
fn given_log_lines_when_regex_applied_then_does_not_match() {
    let re = get_listening_regex();
    let cases = [
        "data_server listening on 127.0.0.1:13000",
        "[2026-01-01T00:00:00Z - INFO] STATION_LISTENING=127.0.0.1:1",
        "STATION_LISTENING=",
    ];

    for case in cases {
        assert!(re.captures(case).is_none(), "Should not match: {case}");
    }
}
