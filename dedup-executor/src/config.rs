//! Harness configuration and compiler selection.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use dedup_core::CompilerKind;

/// Number of suites tested at the same time.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Time budget for one compiler run of one suite.
pub const DEFAULT_SUITE_TIMEOUT: Duration = Duration::from_secs(120);

/// Time budget for one `git clone`.
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Time budget for one `elm-review` run.
pub const DEFAULT_REVIEW_TIMEOUT: Duration = Duration::from_secs(600);

/// Elm package index listing every published package.
pub const PACKAGE_INDEX_URL: &str = "https://package.elm-lang.org/search.json";

/// Clone URL for a registry name; `{name}` is replaced by `author/package`.
pub const DEFAULT_CLONE_URL_TEMPLATE: &str = "git@github.com:{name}.git";

/// Executables used for each compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilers {
    executables: BTreeMap<CompilerKind, String>,
}

impl Compilers {
    /// Resolve each compiler through `lookup`, falling back to its default
    /// executable name.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let executables = CompilerKind::ALL
            .iter()
            .map(|kind| {
                let exe = lookup(kind.env_var()).unwrap_or_else(|| kind.default_executable().to_owned());
                (*kind, exe)
            })
            .collect();
        Self { executables }
    }

    /// Replace the executable of one compiler.
    #[must_use]
    pub fn with_executable(mut self, kind: CompilerKind, executable: impl Into<String>) -> Self {
        self.executables.insert(kind, executable.into());
        self
    }

    /// Executable for `kind`.
    #[must_use]
    pub fn executable(&self, kind: CompilerKind) -> &str {
        self.executables
            .get(&kind)
            .map_or_else(|| kind.default_executable(), String::as_str)
    }
}

impl Default for Compilers {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Settings shared by the harvester, the test orchestrator and the review
/// sweep.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct HarnessConfig {
    /// Root holding `<author>/<package>/<version>` checkouts.
    pub repos_root: PathBuf,
    /// Maximum number of suites, clones or reviews in flight.
    pub concurrency: usize,
    /// Time budget per compiler run.
    pub suite_timeout: Duration,
    /// Time budget per clone.
    pub clone_timeout: Duration,
    /// Time budget per review.
    pub review_timeout: Duration,
    /// Compiler executables.
    pub compilers: Compilers,
    /// Path to an `elm-test-rs` binary; `npx elm-test-rs` when unset.
    pub elm_test_rs: Option<String>,
    /// `elm-review` configuration directory.
    pub review_config: PathBuf,
    /// Clone URL template with a `{name}` placeholder.
    pub clone_url_template: String,
    /// URL of the package index.
    pub index_url: String,
}

impl HarnessConfig {
    /// Defaults rooted at `repos_root`.
    #[must_use]
    pub fn new(repos_root: PathBuf) -> Self {
        Self {
            repos_root,
            concurrency: DEFAULT_CONCURRENCY,
            suite_timeout: DEFAULT_SUITE_TIMEOUT,
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            review_timeout: DEFAULT_REVIEW_TIMEOUT,
            compilers: Compilers::default(),
            elm_test_rs: None,
            review_config: default_review_config(),
            clone_url_template: DEFAULT_CLONE_URL_TEMPLATE.to_owned(),
            index_url: PACKAGE_INDEX_URL.to_owned(),
        }
    }

    /// Clone URL for a registry name.
    #[must_use]
    pub fn clone_url(&self, name: &str) -> String {
        self.clone_url_template.replace("{name}", name)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("repos"))
    }
}

/// `$HOME/src/elm-review-simplify/preview`, or the relative path when no
/// home directory is known.
#[must_use]
pub fn default_review_config() -> PathBuf {
    let relative = PathBuf::from("src/elm-review-simplify/preview");
    match dirs_next::home_dir() {
        Some(home) => home.join(relative),
        None => relative,
    }
}
