//! Status tokens returned to clients after each request.

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Three-digit status written at the start of every response frame.
///
/// The numbering borrows from HTTP but the protocol only ever emits the
/// three constants below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_ERROR: StatusCode = StatusCode(500);

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx: the request itself was malformed.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx: the request was fine but processing or storage failed.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{:03}", self.0)
    }
}
