use crate::error::StationError;

use server_core::error::config::ConfigError;
use server_core::error::lifecycle::LifecycleError;

use common::ErrorLocation;

use std::panic::Location;

#[test]
fn given_station_error_when_displayed_then_includes_kind_message_and_location() {
    let error = StationError::Station {
        message: "boom".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let display = error.to_string();

    assert!(display.starts_with("Station Error: boom ["), "{display}");
    assert!(display.contains("error.rs"), "{display}");
}

/// **VALUE**: Converting a library error records where station received it.
///
/// **BUG THIS CATCHES**: Would catch a `From` impl without `#[track_caller]`, which makes
/// every converted error point at the impl instead of the failing call.
#[test]
fn given_config_error_when_converted_then_location_is_call_site() {
    // GIVEN: A config validation error
    let source = ConfigError::invalid("max_conn", "must be at least 1");

    // WHEN: Converting at this line
    let line = line!() + 1;
    let converted = StationError::from(source);

    // THEN: Config variant, original reason kept, location is this test
    match converted {
        StationError::Config { message, location } => {
            assert!(message.contains("max_conn: must be at least 1"));
            assert_eq!(location.line, line);
            assert!(location.file.ends_with("error.rs"));
        }
        other => panic!("Unexpected variant: {other}"),
    }
}

#[test]
fn given_lifecycle_error_when_converted_then_core_variant() {
    let source = LifecycleError::Startup {
        message: "no announcement".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let converted = StationError::from(source);

    assert!(matches!(converted, StationError::Core { ref message, .. } if message.contains("no announcement")));
}
