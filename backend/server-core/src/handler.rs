//! The capability a server delegates request processing to.

use crate::error::request::ParseError;

use common::{ErrorLocation, StatusCode};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

/// Turns one decoded, right-trimmed request into a status response.
///
/// Implementations must not panic on malformed input: bad requests are a
/// `400`, processing failures a `500`. `receive` runs on the blocking pool,
/// so it may do synchronous file IO.
pub trait RequestHandler: Send + Sync + 'static {
    fn receive(&self, request: &str) -> Response;
}

impl<F> RequestHandler for F
where
    F: Fn(&str) -> Response + Send + Sync + 'static,
{
    fn receive(&self, request: &str) -> Response {
        self(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    payload: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self::status(StatusCode::OK)
    }

    pub fn ok_with(payload: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            payload: Some(payload.into()),
        }
    }

    pub fn bad_request() -> Self {
        Self::status(StatusCode::BAD_REQUEST)
    }

    pub fn internal_error() -> Self {
        Self::status(StatusCode::INTERNAL_ERROR)
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    pub fn code(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match &self.payload {
            Some(payload) => write!(f, "{} {payload}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

/// Split `key:value,key:value` into ordered pairs.
///
/// Every comma-separated part must contain exactly one `:`. A key seen twice
/// keeps its first position and takes the last value. Keys and values are
/// not trimmed.
#[track_caller]
pub fn parse_pairs(text: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for part in text.split(',') {
        let mut fields = part.split(':');
        let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(ParseError::MalformedPair {
                part: part.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        match pairs.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }

    Ok(pairs)
}

/// Value for `key` in pairs returned by [`parse_pairs`].
pub fn pair_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(existing, _)| existing == key)
        .map(|(_, value)| value.as_str())
}
