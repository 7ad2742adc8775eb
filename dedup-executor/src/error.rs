//! Error types for the executor crate.

use std::path::PathBuf;

/// Errors that can occur while harvesting packages or running suites.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// An external program is not on `PATH`.
    #[error("{program} not found on PATH")]
    ToolNotFound { program: String },

    /// A process failed to spawn.
    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    /// The working directory of an invocation does not exist.
    #[error("working directory {path} does not exist")]
    MissingWorkDir { path: PathBuf },

    /// A suite directory is missing its `elm.json`.
    #[error("no elm.json in {path}")]
    MissingElmJson { path: PathBuf },

    /// A background task panicked or was cancelled.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// The package index could not be fetched or decoded.
    #[error("package index request failed: {0}")]
    Index(#[from] reqwest::Error),

    /// The results could not be written as CSV.
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    /// A domain value failed validation.
    #[error(transparent)]
    Core(#[from] dedup_core::CoreError),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
