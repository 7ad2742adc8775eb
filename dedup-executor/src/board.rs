//! In-memory progress board for a test run.
//!
//! Tracks how many suites are still queued, which suites are being tested
//! and since when, and the reports of finished suites.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use dedup_core::SuiteReport;

#[derive(Debug, Default)]
struct BoardState {
    pending: usize,
    in_progress: HashMap<PathBuf, Instant>,
    done: Vec<SuiteReport>,
    errored: usize,
}

/// Thread-safe progress registry shared by the workers and the reporter.
#[derive(Debug)]
pub struct ProgressBoard {
    state: RwLock<BoardState>,
    started: Instant,
}

impl Default for ProgressBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBoard {
    /// Create an empty board; the ETA clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BoardState::default()),
            started: Instant::now(),
        }
    }

    /// Add `count` suites to the queue.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn enqueue(&self, count: usize) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("progress board write lock poisoned");
        state.pending += count;
    }

    /// Move a suite from the queue to in progress.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn start(&self, path: &Path) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("progress board write lock poisoned");
        state.pending = state.pending.saturating_sub(1);
        state.in_progress.insert(path.to_owned(), Instant::now());
    }

    /// Record a finished suite.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn finish(&self, report: SuiteReport) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("progress board write lock poisoned");
        state.in_progress.remove(&report.path);
        state.done.push(report);
    }

    /// Drop a suite that could not be tested.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn abandon(&self, path: &Path) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("progress board write lock poisoned");
        state.in_progress.remove(path);
        state.errored += 1;
    }

    /// Reports of every finished suite, in completion order.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn reports(&self) -> Vec<SuiteReport> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let state = self.state.read().expect("progress board read lock poisoned");
        state.done.clone()
    }

    /// Point-in-time summary of the run.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn summary(&self) -> Summary {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let state = self.state.read().expect("progress board read lock poisoned");
        let mut in_progress: Vec<(PathBuf, Duration)> = state
            .in_progress
            .iter()
            .map(|(path, since)| (path.clone(), since.elapsed()))
            .collect();
        in_progress.sort();
        Summary {
            pending: state.pending,
            in_progress,
            done: state.done.len(),
            errored: state.errored,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Snapshot of a [`ProgressBoard`].
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Suites still queued.
    pub pending: usize,
    /// Suites being tested, with time spent so far.
    pub in_progress: Vec<(PathBuf, Duration)>,
    /// Suites finished.
    pub done: usize,
    /// Suites that could not be tested.
    pub errored: usize,
    /// Time since the board was created.
    pub elapsed: Duration,
}

impl Summary {
    /// Fraction of suites finished, in `[0.0, 1.0]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let total = self.done + self.errored + self.in_progress.len() + self.pending;
        if total == 0 {
            0.0
        } else {
            (self.done + self.errored) as f64 / total as f64
        }
    }

    /// Expected time until the run ends, extrapolated from the rate so far.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        let progress = self.progress();
        if progress <= 0.0 {
            return None;
        }
        Some(self.elapsed.mul_f64(1.0 / progress - 1.0))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pending {}, in progress {}, done {}, errored {} ({:.0}%)",
            self.pending,
            self.in_progress.len(),
            self.done,
            self.errored,
            self.progress() * 100.0
        )?;
        match self.eta() {
            Some(eta) => write!(f, ", expected time until end {}", format_eta(eta)),
            None => Ok(()),
        }
    }
}

/// Format a duration as `Xm YYs`.
#[must_use]
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    format!("{}m {:2}s", secs / 60, secs % 60)
}
