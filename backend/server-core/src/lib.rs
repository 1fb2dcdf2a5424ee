//! Bounded-concurrency line-protocol TCP servers.
//!
//! A [`Server`] owns a listening socket and a fixed [`SlotPool`]. Each
//! accepted connection gets a slot and a worker task that feeds decoded
//! requests to a [`RequestHandler`] and writes back a status token. Shutdown
//! is requested through a [`ShutdownController`]: drain lets live
//! connections finish, kill closes them. [`ServerProcess`] runs a server in
//! its own OS process and stops it with signals.

pub mod config;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod lifecycle;
pub mod shutdown;
pub mod slot_pool;
pub mod storage;
pub mod transport;
pub mod worker;

pub use config::{ServerSettings, ServerTunables, StationConfig};
pub use error::CoreError;
pub use handler::{RequestHandler, Response, parse_pairs};
pub use lifecycle::{ServerProcess, run_server_process};
pub use shutdown::{ShutdownController, ShutdownListener, ShutdownMode};
pub use slot_pool::{SlotGuard, SlotPool};
pub use transport::{Server, ShutdownOutcome};

#[cfg(test)]
mod tests;
