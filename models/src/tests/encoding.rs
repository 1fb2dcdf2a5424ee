use crate::{ModelError, TextEncoding};

#[test]
fn given_known_labels_when_resolved_then_match_encoding() {
    assert_eq!(TextEncoding::from_label("utf-8").unwrap(), TextEncoding::Utf8);
    assert_eq!(TextEncoding::from_label("UTF8").unwrap(), TextEncoding::Utf8);
    assert_eq!(TextEncoding::from_label("ascii").unwrap(), TextEncoding::Ascii);
    assert_eq!(TextEncoding::from_label("US-ASCII").unwrap(), TextEncoding::Ascii);
}

#[test]
fn given_unknown_label_when_resolved_then_returns_validation_error() {
    let result = TextEncoding::from_label("ebcdic");

    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Invalid bytes must be reported, not silently replaced.
///
/// **WHY THIS MATTERS**: A decode failure closes the connection without a response.
/// A lossy decode would instead hand garbage to the handler and persist it.
#[test]
fn given_invalid_utf8_when_decoded_then_returns_decode_error() {
    let bytes = [b't', b'e', 0xff, 0xfe];

    let result = TextEncoding::Utf8.decode(&bytes);

    assert!(matches!(result, Err(ModelError::Decode { .. })));
}

#[test]
fn given_valid_utf8_when_decoded_then_returns_text() {
    let text = TextEncoding::Utf8.decode("temp:21.5°".as_bytes()).unwrap();

    assert_eq!(text, "temp:21.5°");
}

#[test]
fn given_non_ascii_byte_when_ascii_decoded_then_reports_position() {
    let result = TextEncoding::Ascii.decode(&[b'o', b'k', 0xc3]);

    match result {
        Err(ModelError::Decode { message, .. }) => {
            assert!(message.contains("position 2"), "Unexpected message: {message}");
        }
        other => panic!("Expected decode error, got {other:?}"),
    }
}

#[test]
fn given_non_ascii_text_when_ascii_encoded_then_replaces_with_question_mark() {
    assert_eq!(TextEncoding::Ascii.encode("200 é"), b"200 ?".to_vec());
    assert_eq!(TextEncoding::Utf8.encode("200"), b"200".to_vec());
}
