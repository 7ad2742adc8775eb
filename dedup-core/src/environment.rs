use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::digest::SpecDigest;
use crate::error::CoreError;
use crate::package::{PackageName, ToolchainId};

/// A development environment declaration: the tools to install and the
/// language toolchains to enable.
///
/// Both collections are sets that keep first-seen order so renderings are
/// stable. The record is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct EnvironmentSpec {
    /// Packages resolved from the external package index.
    pub packages: IndexSet<PackageName>,
    /// Toolchains enabled by name (e.g. `rust`).
    #[serde(default)]
    pub toolchains: IndexSet<ToolchainId>,
}

impl EnvironmentSpec {
    /// Create an environment from already validated names.
    #[must_use]
    pub fn new(
        packages: impl IntoIterator<Item = PackageName>,
        toolchains: impl IntoIterator<Item = ToolchainId>,
    ) -> Self {
        Self {
            packages: packages.into_iter().collect(),
            toolchains: toolchains.into_iter().collect(),
        }
    }

    /// Parse names and build an environment.
    ///
    /// # Errors
    /// Returns the first [`CoreError::InvalidPackageName`] or
    /// [`CoreError::InvalidToolchain`] encountered.
    pub fn parse<P, T>(packages: P, toolchains: T) -> Result<Self, CoreError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let packages = packages
            .into_iter()
            .map(PackageName::new)
            .collect::<Result<Vec<_>, _>>()?;
        let toolchains = toolchains
            .into_iter()
            .map(ToolchainId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(packages, toolchains))
    }

    /// Load an environment declaration from JSON.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if the document is malformed or any name
    /// fails validation.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Canonical JSON rendering, byte-identical for equal declarations.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the canonical JSON rendering.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn digest(&self) -> Result<SpecDigest, CoreError> {
        Ok(SpecDigest::of(self.to_canonical_json()?.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_packages_collapse_and_keep_order() {
        let env = match EnvironmentSpec::parse(["git", "nodejs", "git"], ["rust"]) {
            Ok(e) => e,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let names: Vec<&str> = env.packages.iter().map(PackageName::as_str).collect();
        assert_eq!(names, ["git", "nodejs"]);
        assert_eq!(env.toolchains.len(), 1);
    }

    #[test]
    fn parse_rejects_invalid_toolchain() {
        let result = EnvironmentSpec::parse(["git"], [""]);
        assert!(matches!(result, Err(CoreError::InvalidToolchain { .. })));
    }

    #[test]
    fn from_json_validates_names() {
        let ok = EnvironmentSpec::from_json(r#"{"packages":["git"],"toolchains":["rust"]}"#);
        assert!(ok.is_ok(), "valid document must load");

        let missing_toolchains = EnvironmentSpec::from_json(r#"{"packages":["git"]}"#);
        assert!(missing_toolchains.is_ok(), "toolchains default to empty");

        let bad = EnvironmentSpec::from_json(r#"{"packages":["not valid"]}"#);
        assert!(matches!(bad, Err(CoreError::Json(_))), "invalid name must fail to load");
    }

    #[test]
    fn canonical_json_round_trips() {
        let env = match EnvironmentSpec::parse(["git", "elmPackages.elm"], ["rust"]) {
            Ok(e) => e,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let json = match env.to_canonical_json() {
            Ok(j) => j,
            Err(e) => panic!("serialization failed: {e}"),
        };
        match EnvironmentSpec::from_json(&json) {
            Ok(back) => assert_eq!(back, env),
            Err(e) => panic!("reload failed: {e}"),
        }
    }
}
