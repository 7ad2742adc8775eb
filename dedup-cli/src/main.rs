//! Entry point for the `elm-dedup` binary.

use std::process::ExitCode;

use clap::Parser;
use dedup_cli::{commands, log_filter, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, cli.quiet))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::from(e.exit_code())
        }
    }
}
