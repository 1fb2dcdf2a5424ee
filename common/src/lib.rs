//! Shared building blocks for the station crates.
//!
//! - [`ErrorLocation`]: call-site capture attached to every error variant
//! - [`StatusCode`]: the three-digit status token written back to clients

pub mod error;
pub mod status_code;

pub use error::error_location::ErrorLocation;
pub use status_code::StatusCode;

#[cfg(test)]
mod tests;
