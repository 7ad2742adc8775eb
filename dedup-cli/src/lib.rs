//! `elm-dedup` command-line front end.
//!
//! Parses arguments, sets up logging and dispatches to the environment,
//! sandbox and harness commands.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod report;

pub use cli::Cli;
pub use error::CliError;

/// Log filter for the verbosity flags; `RUST_LOG` takes precedence.
#[must_use]
pub fn log_filter(verbose: u8, quiet: bool) -> tracing_subscriber::EnvFilter {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}
