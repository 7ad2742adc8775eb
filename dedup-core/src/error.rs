/// Errors produced by the `dedup-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A package name is not a valid attribute path in the package index.
    #[error("invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    /// A toolchain identifier is empty or contains illegal characters.
    #[error("invalid toolchain id '{id}': {reason}")]
    InvalidToolchain { id: String, reason: String },

    /// An output kind is not a valid output identifier.
    #[error("invalid output kind '{kind}'")]
    InvalidOutputKind { kind: String },

    /// A sandbox name cannot be used as a derivation name.
    #[error("invalid sandbox name '{name}': {reason}")]
    InvalidSandboxName { name: String, reason: String },

    /// A sandbox or environment field failed validation.
    #[error("declaration validation failed for field '{field}': {reason}")]
    DeclarationValidation { field: String, reason: String },

    /// A registry package name is not of the form `author/package`.
    #[error("could not parse '{name}' as author/package-name")]
    InvalidRegistryName { name: String },

    /// A declaration could not be (de)serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
