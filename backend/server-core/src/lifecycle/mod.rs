//! Running a server as an isolated child process and controlling it from outside.

pub mod entry;
pub mod process;
pub mod spawn;

pub use entry::run_server_process;
pub use process::ServerProcess;
