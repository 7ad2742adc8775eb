use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::elm::{CompilerKind, ElmTestVersion};

/// Outcome of running a suite with one compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunResult {
    /// The runner exited; `true` when the tests passed.
    Finished(bool),
    /// The runner exceeded its time budget and was killed.
    TimedOut,
}

impl RunResult {
    /// Returns `true` for a passing run.
    #[must_use]
    pub fn passed(self) -> bool {
        self == RunResult::Finished(true)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunResult::Finished(true) => f.write_str("✅"),
            RunResult::Finished(false) => f.write_str("❌"),
            RunResult::TimedOut => f.write_str("⏰"),
        }
    }
}

/// Per-compiler outcomes of one suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RunResults {
    /// Test framework version the suite targets.
    pub version: ElmTestVersion,
    /// Outcome per compiler that was run.
    pub outcomes: BTreeMap<CompilerKind, RunResult>,
}

impl RunResults {
    /// Start an empty result set for a suite of the given version.
    #[must_use]
    pub fn new(version: ElmTestVersion) -> Self {
        Self {
            version,
            outcomes: BTreeMap::new(),
        }
    }

    /// Record the outcome of one compiler.
    pub fn record(&mut self, compiler: CompilerKind, result: RunResult) {
        self.outcomes.insert(compiler, result);
    }

    /// Outcome for `compiler`, if it was run.
    #[must_use]
    pub fn get(&self, compiler: CompilerKind) -> Option<RunResult> {
        self.outcomes.get(&compiler).copied()
    }

    /// Returns `true` when every compiler of the suite's version passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.version
            .compilers()
            .iter()
            .all(|c| self.get(*c).is_some_and(RunResult::passed))
    }

    /// Sort key for reports: disagreements between compilers first, then
    /// wire-codec regressions, timeouts, failures, and passing suites last.
    /// Within each tier 2.x suites come before 1.x suites.
    #[must_use]
    pub fn anomaly_rank(&self) -> u8 {
        use CompilerKind::{Elm, LamderaNext, LamderaNextNoWire, LamderaStable, LamderaStableNoWire};

        let differs = |a: CompilerKind, b: CompilerKind| self.get(a) != self.get(b);
        let v1 = self.version == ElmTestVersion::V1;

        if !v1 && differs(Elm, LamderaStableNoWire) {
            return 0;
        }
        if !v1 && differs(Elm, LamderaNextNoWire) {
            return 1;
        }
        if v1 && differs(Elm, LamderaStableNoWire) {
            return 2;
        }
        if !v1 && differs(LamderaStableNoWire, LamderaStable) {
            return 3;
        }
        if !v1 && differs(LamderaNextNoWire, LamderaNext) {
            return 4;
        }
        if v1 && differs(LamderaStableNoWire, LamderaStable) {
            return 5;
        }
        let tier = match self.get(Elm) {
            Some(RunResult::TimedOut) => 6,
            Some(RunResult::Finished(false)) | None => 8,
            Some(RunResult::Finished(true)) => 10,
        };
        tier + u8::from(v1)
    }
}

/// A finished suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SuiteReport {
    /// Version root of the suite (`repos/<author>/<package>/<version>`).
    pub path: PathBuf,
    /// Wall-clock time spent on all compilers.
    pub elapsed: Duration,
    /// When the last compiler finished.
    pub finished_at: DateTime<Utc>,
    /// Per-compiler outcomes.
    pub results: RunResults,
}

impl SuiteReport {
    /// Create a report stamped with the current time.
    #[must_use]
    pub fn new(path: PathBuf, elapsed: Duration, results: RunResults) -> Self {
        Self {
            path,
            elapsed,
            finished_at: Utc::now(),
            results,
        }
    }
}

/// Order reports for display: by anomaly rank, most recently finished first
/// within a rank.
pub fn sort_for_display(reports: &mut [SuiteReport]) {
    reports.reverse();
    reports.sort_by_key(|report| report.results.anomaly_rank());
}
