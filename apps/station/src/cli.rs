use crate::error::StationError;

use common::ErrorLocation;
use models::{ServerKind, ServerSpec, ServerSpecBuilder, TextEncoding};

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "station", version, about = "Sensor station TCP servers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start servers and supervise them. Ctrl-C stops gracefully, a second Ctrl-C kills.
    Start(StartArgs),

    /// Run a single server in this process (used by `start`).
    #[command(hide = true)]
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    All,
    Data,
    Log,
    Time,
}

impl Target {
    pub fn kinds(self) -> Vec<ServerKind> {
        match self {
            Target::All => ServerKind::ALL.to_vec(),
            Target::Data => vec![ServerKind::Data],
            Target::Log => vec![ServerKind::Log],
            Target::Time => vec![ServerKind::Time],
        }
    }
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Which server(s) to start
    #[arg(value_enum, default_value_t = Target::All)]
    pub target: Target,

    /// Directory holding station.json
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Mirror logs to stdout
    #[arg(long)]
    pub log_console: bool,

    /// Override the number of connection slots per server
    #[arg(long)]
    pub max_conn: Option<usize>,

    /// Override the listening host
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub kind: ServerKind,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub host: String,

    #[arg(long)]
    pub port: u16,

    /// Idle timeout in seconds
    #[arg(long)]
    pub timeout: u64,

    #[arg(long)]
    pub max_conn: usize,

    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    #[arg(long)]
    pub logs_dir: PathBuf,

    #[arg(long)]
    pub log_console: bool,

    #[arg(long)]
    pub debug: bool,
}

impl ServeArgs {
    #[track_caller]
    pub fn to_spec(&self) -> Result<ServerSpec, StationError> {
        let invalid = |message: String| StationError::Station {
            message,
            location: ErrorLocation::from(Location::caller()),
        };

        let encoding = TextEncoding::from_label(&self.encoding).map_err(|e| invalid(e.to_string()))?;

        let mut builder = ServerSpecBuilder::default()
            .with_kind(self.kind)
            .with_name(&self.name)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_conn(self.max_conn)
            .with_encoding(encoding)
            .with_logs_dir(&self.logs_dir)
            .with_log_console(self.log_console)
            .with_debug(self.debug);

        if let Some(dir) = &self.storage_dir {
            builder = builder.with_storage_dir(dir);
        }

        builder.build().map_err(|e| invalid(e.to_string()))
    }
}
