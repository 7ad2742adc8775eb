//! Error types for the Nix crate.

/// Errors that can occur while rendering or provisioning declarations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NixError {
    /// A required external tool is not on `PATH`.
    #[error("{tool} not found on PATH")]
    ToolNotFound { tool: String },

    /// The profile script does not parse as shell source.
    #[error("profile script is not valid shell: {message}")]
    ProfileSyntax { message: String },

    /// A declaration failed validation or serialization.
    #[error(transparent)]
    Core(#[from] dedup_core::CoreError),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
