use common::ErrorLocation;

use thiserror::Error as ThisError;

/// A request line that does not follow the `key:value,key:value` shape.
#[derive(Debug, ThisError)]
pub enum ParseError {
    #[error("Parse Error: expected 'key:value' but got '{part}' {location}")]
    MalformedPair {
        part: String,
        location: ErrorLocation,
    },
}
