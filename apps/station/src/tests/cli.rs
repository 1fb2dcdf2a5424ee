// Unit tests for argument parsing and the serve/start contract

use crate::cli::{Cli, Command, Target};
use crate::commands::start::resolve_config;

use models::{ServerKind, ServerSpecBuilder, TextEncoding};
use server_core::lifecycle::spawn::build_serve_command;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tempfile::TempDir;

#[test]
fn given_no_target_when_parsing_start_then_defaults_to_all() {
    let cli = Cli::try_parse_from(["station", "start"]).unwrap();

    let Command::Start(args) = cli.command else {
        panic!("Expected start command");
    };
    assert_eq!(args.target, Target::All);
    assert_eq!(args.config_dir, PathBuf::from("."));
    assert_eq!(args.target.kinds(), ServerKind::ALL.to_vec());
    assert!(!args.debug);
}

#[test]
fn given_flags_when_parsing_start_then_overrides_captured() {
    let cli = Cli::try_parse_from([
        "station",
        "start",
        "time",
        "--debug",
        "--log-console",
        "--max-conn",
        "4",
        "--host",
        "0.0.0.0",
    ])
    .unwrap();

    let Command::Start(args) = cli.command else {
        panic!("Expected start command");
    };
    assert_eq!(args.target.kinds(), vec![ServerKind::Time]);
    assert!(args.debug && args.log_console);
    assert_eq!(args.max_conn, Some(4));
    assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
}

#[test]
fn given_unknown_target_when_parsing_start_then_rejected() {
    assert!(Cli::try_parse_from(["station", "start", "weather"]).is_err());
}

/// **VALUE**: The command line a parent builds for its child parses back into the same spec.
///
/// **WHY THIS MATTERS**: Parent and child live in different crates and only agree through
/// flag names. A renamed flag on either side makes every spawned server exit at startup.
///
/// **BUG THIS CATCHES**: Would catch a flag constant in server-core drifting from the clap
/// field name in the station CLI.
#[test]
fn given_spawned_command_line_when_parsed_as_serve_then_yields_same_spec() {
    // GIVEN: A spec and the command line built for it
    let spec = ServerSpecBuilder::default()
        .with_kind(ServerKind::Log)
        .with_name("log_server")
        .with_timeout(Duration::from_secs(7))
        .with_max_conn(3)
        .with_encoding(TextEncoding::Ascii)
        .with_storage_dir("/tmp/log_data")
        .with_logs_dir("/tmp/logs")
        .with_log_console(true)
        .build()
        .unwrap();
    let cmd = build_serve_command(Path::new("station"), &spec, "127.0.0.1", 4000);
    let mut argv = vec!["station".to_string()];
    argv.extend(
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string()),
    );

    // WHEN: Parsing it as the child would
    let cli = Cli::try_parse_from(argv).unwrap();

    // THEN: The child rebuilds an identical spec and sees the same address
    let Command::Serve(args) = cli.command else {
        panic!("Expected serve command");
    };
    assert_eq!(args.host, "127.0.0.1");
    assert_eq!(args.port, 4000);
    assert_eq!(args.to_spec().unwrap(), spec);
}

#[test]
fn given_serve_args_with_bad_encoding_when_converted_then_error() {
    let cli = Cli::try_parse_from([
        "station",
        "serve",
        "--kind",
        "time",
        "--name",
        "t",
        "--host",
        "127.0.0.1",
        "--port",
        "0",
        "--timeout",
        "30",
        "--max-conn",
        "1",
        "--encoding",
        "latin-9",
        "--logs-dir",
        "logs",
    ])
    .unwrap();

    let Command::Serve(args) = cli.command else {
        panic!("Expected serve command");
    };
    assert!(args.to_spec().is_err());
}

#[test]
fn given_overrides_when_resolving_config_then_applied_over_file() {
    // GIVEN: No config file and start flags overriding slots and host
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "station",
        "start",
        "--config-dir",
        dir.path().to_str().unwrap(),
        "--max-conn",
        "2",
        "--host",
        "localhost",
    ])
    .unwrap();
    let Command::Start(args) = cli.command else {
        panic!("Expected start command");
    };

    // WHEN: Resolving
    let config = resolve_config(&args).unwrap();

    // THEN: Overrides win, the rest is default
    assert_eq!(config.max_conn, 2);
    assert_eq!(config.host, "localhost");
    assert_eq!(config.data.port, 13000);
}

#[test]
fn given_zero_max_conn_override_when_resolving_config_then_rejected() {
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "station",
        "start",
        "--config-dir",
        dir.path().to_str().unwrap(),
        "--max-conn",
        "0",
    ])
    .unwrap();
    let Command::Start(args) = cli.command else {
        panic!("Expected start command");
    };

    assert!(resolve_config(&args).is_err());
}
