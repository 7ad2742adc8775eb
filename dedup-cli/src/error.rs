//! Error types for the command-line crate.

use std::path::PathBuf;

/// Exit code for invalid arguments or declaration files.
pub const EXIT_USAGE: u8 = 2;

/// Exit code when the external tooling is missing or rejects a declaration.
pub const EXIT_PROVISIONING: u8 = 3;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Errors surfaced by `elm-dedup` commands.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CliError {
    /// A declaration file could not be read.
    #[error("cannot read {path}: {source}")]
    ReadSpec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declaration failed validation.
    #[error("invalid declaration: {0}")]
    Declaration(#[from] dedup_core::CoreError),

    /// Rendering or provisioning through Nix failed.
    #[error(transparent)]
    Nix(#[from] dedup_nix::NixError),

    /// Harvesting, testing or reviewing failed.
    #[error(transparent)]
    Executor(#[from] dedup_executor::ExecutorError),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        use dedup_executor::ExecutorError;
        use dedup_nix::NixError;

        match self {
            CliError::ReadSpec { .. }
            | CliError::Declaration(_)
            | CliError::Nix(NixError::Core(_))
            | CliError::Executor(ExecutorError::Core(_)) => EXIT_USAGE,
            CliError::Nix(_) | CliError::Executor(ExecutorError::ToolNotFound { .. }) => EXIT_PROVISIONING,
            CliError::Executor(_) | CliError::Io(_) => EXIT_FAILURE,
        }
    }
}
