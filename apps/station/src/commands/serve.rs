use crate::cli::ServeArgs;
use crate::error::StationError;
use crate::logger::{self, LogSettings};

use server_core::{ShutdownOutcome, run_server_process};

/// `station serve`: the body of a server child process.
pub async fn run(args: ServeArgs) -> Result<ShutdownOutcome, StationError> {
    let spec = args.to_spec()?;

    logger::initialize(&LogSettings {
        log_file: spec.log_file(),
        console: spec.log_console,
        debug: spec.debug,
    })?;

    Ok(run_server_process(spec, &args.host, args.port).await?)
}
