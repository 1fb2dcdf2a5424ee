use crate::handler::RequestHandler;
use crate::handlers::TimeHandler;
use crate::handlers::time::format_seconds;

use chrono::Utc;
use common::StatusCode;

fn seconds_of(response: &crate::handler::Response) -> f64 {
    response
        .payload()
        .expect("payload")
        .parse::<f64>()
        .expect("numeric payload")
}

fn utc_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[test]
fn given_utc_with_offset_when_received_then_returns_shifted_epoch() {
    // GIVEN: A time handler
    let handler = TimeHandler::new();

    // WHEN: Asking for UTC plus one hour
    let before = utc_now();
    let response = handler.receive("timezone:utc,offset_seconds:3600");
    let after = utc_now();

    // THEN: The payload lies within the shifted window
    assert_eq!(response.code(), StatusCode::OK);
    let seconds = seconds_of(&response);
    assert!(seconds >= before + 3600.0 && seconds <= after + 3600.0);
}

#[test]
fn given_utc_without_offset_when_received_then_returns_now() {
    let handler = TimeHandler::new();

    let before = utc_now();
    let response = handler.receive("timezone:utc");
    let after = utc_now();

    let seconds = seconds_of(&response);
    assert!(seconds >= before && seconds <= after);
    assert!(response.payload().unwrap_or_default().contains('.'));
}

/// **VALUE**: The payload always carries a fractional part, even on a whole second.
///
/// **WHY THIS MATTERS**: Clients written against the float output (`1700003600.0`) split on
/// the decimal point. A bare `1700003600` once every million requests breaks them.
///
/// **BUG THIS CATCHES**: Would catch formatting through `f64::to_string`, which drops `.0`.
#[test]
fn given_whole_and_fractional_seconds_when_formatted_then_decimal_point_always_present() {
    assert_eq!(format_seconds(1_700_003_600.0), "1700003600.0");
    assert_eq!(format_seconds(1_700_003_600.25), "1700003600.25");
    assert_eq!(format_seconds(0.0), "0.0");
}

#[test]
fn given_local_when_received_then_ok_with_payload() {
    let handler = TimeHandler::new();

    let response = handler.receive("timezone:local");

    assert_eq!(response.code(), StatusCode::OK);
    assert!(seconds_of(&response) > 0.0);
}

/// **VALUE**: Every invalid time request maps to `400`, never a panic.
///
/// **BUG THIS CATCHES**: Would catch an unchecked `offset * 1_000_000` overflowing on huge
/// offsets, or results before the epoch being returned as negative numbers.
#[test]
fn given_invalid_time_requests_when_received_then_bad_request() {
    // GIVEN: A time handler and invalid requests
    let handler = TimeHandler::new();
    let cases = [
        "timezone:mars",
        "offset_seconds:10",
        "timezone:utc,offset_seconds:soon",
        "timezone:utc,offset_seconds:1.5",
        "timezone:utc,offset_seconds:-99999999999",
        "timezone:utc,offset_seconds:9223372036854775807",
        "timezone",
        "",
    ];

    // WHEN/THEN: Each one is rejected
    for case in cases {
        assert_eq!(handler.receive(case).to_string(), "400", "Should reject: {case:?}");
    }
}
