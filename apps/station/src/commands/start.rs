use crate::cli::StartArgs;
use crate::error::StationError;
use crate::logger::{self, LogSettings, SUPERVISOR_LOG_FILE_NAME};
use crate::supervisor::Supervisor;

use server_core::StationConfig;

use log::info;

/// Load configuration and apply command-line overrides.
pub fn resolve_config(args: &StartArgs) -> Result<StationConfig, StationError> {
    let mut config = StationConfig::load(&args.config_dir)?;

    if let Some(max_conn) = args.max_conn {
        config.max_conn = max_conn;
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }

    config.validate()?;
    Ok(config)
}

/// `station start`: launch the selected servers and supervise them until they exit.
pub async fn run(args: StartArgs) -> Result<(), StationError> {
    let config = resolve_config(&args)?;

    logger::initialize(&LogSettings {
        log_file: config.logs_dir.join(SUPERVISOR_LOG_FILE_NAME),
        console: args.log_console,
        debug: args.debug,
    })?;

    let kinds = args.target.kinds();
    info!("Starting {kinds:?} with {} slots each", config.max_conn);

    let supervisor = Supervisor::from_config(&config, &kinds, args.log_console, args.debug)?;
    for (name, addr) in supervisor.start_all().await? {
        info!("{name} listening on {addr}");
    }

    supervisor.run_until_stopped().await
}
