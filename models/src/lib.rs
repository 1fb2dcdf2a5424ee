//! Domain models for the station servers.
//!
//! Pure data describing *what* a server is (its kind, its limits, how it
//! decodes bytes). No sockets, no files, no processes live here; those are
//! `server-core`'s job.

pub mod encoding;
pub mod error;
pub mod server_kind;
pub mod server_spec;

pub use common::ErrorLocation;
pub use encoding::TextEncoding;
pub use error::model_error::ModelError;
pub use server_kind::ServerKind;
pub use server_spec::ServerSpec;
pub use server_spec::builder::ServerSpecBuilder;

#[cfg(test)]
mod tests;
