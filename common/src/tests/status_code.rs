use crate::StatusCode;

#[test]
fn given_status_constants_when_displayed_then_render_three_digits() {
    assert_eq!(StatusCode::OK.to_string(), "200");
    assert_eq!(StatusCode::BAD_REQUEST.to_string(), "400");
    assert_eq!(StatusCode::INTERNAL_ERROR.to_string(), "500");
}

/// **VALUE**: Handlers and logs branch on status category, not on the raw number.
///
/// **BUG THIS CATCHES**: Would catch off-by-one range bounds that classify 500 as a
/// client error or 400 as a success.
#[test]
fn given_status_codes_when_categorised_then_ranges_are_exclusive() {
    assert!(StatusCode::OK.is_success());
    assert!(!StatusCode::OK.is_client_error());

    assert!(StatusCode::BAD_REQUEST.is_client_error());
    assert!(!StatusCode::BAD_REQUEST.is_server_error());

    assert!(StatusCode::INTERNAL_ERROR.is_server_error());
    assert!(!StatusCode::INTERNAL_ERROR.is_success());
}

#[test]
fn given_u16_when_converted_then_wraps_value() {
    assert_eq!(StatusCode::from(400), StatusCode::BAD_REQUEST);
}
