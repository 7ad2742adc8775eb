use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An entry of the Elm package index (`search.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ElmPackage {
    /// Registry name, `author/package`.
    pub name: String,
    /// Latest published version, also the git tag to clone.
    pub version: String,
}

impl ElmPackage {
    /// Create an index entry.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Split the registry name into `(author, package)`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRegistryName`] unless the name has exactly
    /// two non-empty `/`-separated parts.
    pub fn split_name(&self) -> Result<(&str, &str), CoreError> {
        match self.name.split('/').collect::<Vec<&str>>()[..] {
            [author, package] if !author.is_empty() && !package.is_empty() => Ok((author, package)),
            _ => Err(CoreError::InvalidRegistryName {
                name: self.name.clone(),
            }),
        }
    }

    /// Directory of this version below the repositories root:
    /// `<author>/<package>/<version>`.
    ///
    /// # Errors
    /// Propagates [`ElmPackage::split_name`] errors.
    pub fn relative_dir(&self) -> Result<PathBuf, CoreError> {
        let (author, package) = self.split_name()?;
        Ok(PathBuf::from(author).join(package).join(&self.version))
    }
}

impl fmt::Display for ElmPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Major version of `elm-explorations/test` a suite is written against.
///
/// It decides which test runner is used and which compilers are exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElmTestVersion {
    /// `elm-explorations/test` 1.x, run with `elm-test`.
    V1,
    /// `elm-explorations/test` 2.x, run with `elm-test-rs`.
    V2,
}

const TEST_PACKAGE: &str = "elm-explorations/test";

impl ElmTestVersion {
    /// Detect the version from the contents of an `elm.json`.
    ///
    /// Looks the test package up in the package (`test-dependencies`) and
    /// application (`test-dependencies.direct`) layouts, then in the regular
    /// dependencies. Falls back to a plain substring search when the file is
    /// not valid JSON. Anything that is not clearly 1.x is treated as 2.x.
    #[must_use]
    pub fn detect(elm_json: &str) -> Self {
        let Ok(doc) = serde_json::from_str::<serde_json::Value>(elm_json) else {
            return if elm_json.contains("\"elm-explorations/test\": \"1") {
                ElmTestVersion::V1
            } else {
                ElmTestVersion::V2
            };
        };

        let constraint = ["test-dependencies", "dependencies"]
            .iter()
            .filter_map(|section| doc.get(section))
            .flat_map(|section| {
                [
                    section.get(TEST_PACKAGE),
                    section.get("direct").and_then(|d| d.get(TEST_PACKAGE)),
                ]
            })
            .flatten()
            .find_map(serde_json::Value::as_str);

        match constraint {
            Some(c) if c.trim_start().starts_with('1') => ElmTestVersion::V1,
            _ => ElmTestVersion::V2,
        }
    }

    /// Compilers exercised for suites of this version, in run order.
    #[must_use]
    pub fn compilers(self) -> &'static [CompilerKind] {
        match self {
            ElmTestVersion::V1 => &CompilerKind::ALL[..3],
            ElmTestVersion::V2 => &CompilerKind::ALL,
        }
    }
}

impl fmt::Display for ElmTestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElmTestVersion::V1 => f.write_str("1"),
            ElmTestVersion::V2 => f.write_str("2"),
        }
    }
}

/// The compilers a suite is compared across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompilerKind {
    /// The reference Elm compiler.
    Elm,
    /// Lamdera stable with wire codec generation disabled.
    LamderaStableNoWire,
    /// Lamdera stable.
    LamderaStable,
    /// Lamdera next with wire codec generation disabled.
    LamderaNextNoWire,
    /// Lamdera next.
    LamderaNext,
}

impl CompilerKind {
    /// Every compiler, in run order.
    pub const ALL: [CompilerKind; 5] = [
        CompilerKind::Elm,
        CompilerKind::LamderaStableNoWire,
        CompilerKind::LamderaStable,
        CompilerKind::LamderaNextNoWire,
        CompilerKind::LamderaNext,
    ];

    /// Environment variable overriding the compiler executable.
    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            CompilerKind::Elm => "ELM",
            CompilerKind::LamderaStableNoWire => "LAMDERA_STABLE_NO_WIRE",
            CompilerKind::LamderaStable => "LAMDERA_STABLE",
            CompilerKind::LamderaNextNoWire => "LAMDERA_NEXT_NO_WIRE",
            CompilerKind::LamderaNext => "LAMDERA_NEXT",
        }
    }

    /// Executable used when no override is set.
    #[must_use]
    pub fn default_executable(self) -> &'static str {
        match self {
            CompilerKind::Elm => "elm",
            CompilerKind::LamderaStableNoWire => "lamdera-stable-no-wire",
            CompilerKind::LamderaStable => "lamdera-stable",
            CompilerKind::LamderaNextNoWire => "lamdera-next-no-wire",
            CompilerKind::LamderaNext => "lamdera-next",
        }
    }

    /// Column label used in reports and exports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CompilerKind::Elm => "Elm",
            CompilerKind::LamderaStableNoWire => "Lamdera stable no wire",
            CompilerKind::LamderaStable => "Lamdera stable",
            CompilerKind::LamderaNextNoWire => "Lamdera next no wire",
            CompilerKind::LamderaNext => "Lamdera next",
        }
    }
}
