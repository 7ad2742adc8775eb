use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A package attribute path in the external package index (e.g. `"git"`,
/// `"elmPackages.elm-review"`).
///
/// Each dot-separated segment starts with an ASCII letter or `_` and
/// continues with letters, digits, `_`, `-` or `'`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub struct PackageName(String);

impl PackageName {
    /// Validates and wraps a package attribute path.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidPackageName`] if the name is empty or any
    /// segment is not a valid attribute identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidPackageName {
                name,
                reason: "name is empty".to_owned(),
            });
        }
        let first_error = name.split('.').find_map(|segment| check_identifier(segment).err());
        if let Some(reason) = first_error {
            return Err(CoreError::InvalidPackageName { name, reason });
        }
        Ok(Self(name))
    }

    /// Returns the attribute path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

/// A language toolchain to enable in an environment (e.g. `"rust"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub struct ToolchainId(String);

impl ToolchainId {
    /// Validates and wraps a toolchain identifier.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidToolchain`] if the id is not a single
    /// attribute identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        match check_identifier(&id) {
            Ok(()) => Ok(Self(id)),
            Err(reason) => Err(CoreError::InvalidToolchain { id, reason }),
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolchainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ToolchainId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ToolchainId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToolchainId> for String {
    fn from(id: ToolchainId) -> Self {
        id.0
    }
}

/// A build output of a package that can be installed alongside the default.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub enum OutputKind {
    /// The default output.
    Out,
    /// Development headers, pkg-config files and static metadata.
    Dev,
    /// Shared libraries split from the default output.
    Lib,
    /// Executables split from the default output.
    Bin,
    /// Manual pages.
    Man,
    /// Documentation.
    Doc,
    /// GNU info pages.
    Info,
    /// Static archives.
    Static,
    /// Any other output name a package declares.
    Other(CustomOutput),
}

/// An output name outside the well-known set.
///
/// Only obtainable by parsing an [`OutputKind`], so a well-known name such
/// as `dev` can never hide in [`OutputKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomOutput(String);

impl CustomOutput {
    /// Returns the output name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl OutputKind {
    /// Returns the output name as used by the package manager.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OutputKind::Out => "out",
            OutputKind::Dev => "dev",
            OutputKind::Lib => "lib",
            OutputKind::Bin => "bin",
            OutputKind::Man => "man",
            OutputKind::Doc => "doc",
            OutputKind::Info => "info",
            OutputKind::Static => "static",
            OutputKind::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "out" => OutputKind::Out,
            "dev" => OutputKind::Dev,
            "lib" => OutputKind::Lib,
            "bin" => OutputKind::Bin,
            "man" => OutputKind::Man,
            "doc" => OutputKind::Doc,
            "info" => OutputKind::Info,
            "static" => OutputKind::Static,
            other => {
                if check_identifier(other).is_err() {
                    return Err(CoreError::InvalidOutputKind { kind: other.to_owned() });
                }
                OutputKind::Other(CustomOutput(other.to_owned()))
            }
        };
        Ok(kind)
    }
}

impl TryFrom<String> for OutputKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputKind> for String {
    fn from(kind: OutputKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// Checks a single attribute identifier segment.
fn check_identifier(segment: &str) -> Result<(), String> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err("empty attribute segment".to_owned()),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(c) => return Err(format!("segment '{segment}' starts with '{c}'")),
    }
    if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(*c, '_' | '-' | '\''))) {
        return Err(format!("segment '{segment}' contains '{c}'"));
    }
    Ok(())
}
