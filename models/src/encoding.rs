//! Byte <-> text conversion for request and response frames.

use crate::{ErrorLocation, ModelError};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

/// Character encoding applied to every frame on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
}

impl TextEncoding {
    /// Resolve a configuration label such as `"utf-8"` or `"ascii"`.
    #[track_caller]
    pub fn from_label(label: &str) -> Result<Self, ModelError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            other => Err(ModelError::Validation {
                message: format!("Unsupported encoding: {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Strict decode. Invalid input is an error, never replaced.
    #[track_caller]
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ModelError> {
        match self {
            TextEncoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| ModelError::Decode {
                    message: format!("'{}' codec can't decode bytes: {e}", self.label()),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(position) => Err(ModelError::Decode {
                    message: format!(
                        "'{}' codec can't decode byte 0x{:02x} in position {position}",
                        self.label(),
                        bytes[position]
                    ),
                    location: ErrorLocation::from(Location::caller()),
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }

    /// Encode outgoing text. Characters outside ASCII become `?` for [`TextEncoding::Ascii`].
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

impl Display for TextEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(self.label())
    }
}
