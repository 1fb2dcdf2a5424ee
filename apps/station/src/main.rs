use station::cli::{Cli, Command};
use station::commands;

use server_core::ShutdownOutcome;

use std::process::{ExitCode, exit};

use clap::Parser;
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Start(args) => commands::start::run(args).await,
        Command::Serve(args) => match commands::serve::run(args).await {
            // Killed connections must not wait on in-flight handler threads.
            Ok(ShutdownOutcome::Killed { .. }) => exit(0),
            Ok(ShutdownOutcome::Drained) => Ok(()),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
