//! `elm-review` sweep over every checked-out package version.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::backend::{CommandBackend, Invocation};
use crate::config::HarnessConfig;
use crate::ExecutorError;

/// Exact stdout of a clean `elm-review` run.
pub const CLEAN_OUTPUT: &str = "I found no errors!\n";

/// Result of reviewing one version root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// No findings.
    Clean,
    /// Anything else, with the full output for inspection.
    Flagged {
        /// Reviewed directory.
        path: PathBuf,
        /// Captured stdout.
        output: String,
    },
}

/// Tally of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Directories without findings.
    pub clean: usize,
    /// Directories with findings, failures or timeouts, in completion order.
    pub flagged: Vec<(PathBuf, String)>,
}

/// Runs `elm-review` in many directories concurrently.
pub struct ReviewSweep<B: CommandBackend> {
    backend: B,
    config: HarnessConfig,
}

impl<B: CommandBackend + 'static> ReviewSweep<B> {
    /// Create a sweep using the review configuration of `config`.
    #[must_use]
    pub fn new(backend: B, config: HarnessConfig) -> Self {
        Self { backend, config }
    }

    /// `elm-review` invocation for one directory.
    #[must_use]
    pub fn invocation(&self, path: PathBuf) -> Invocation {
        Invocation::new("elm-review")
            .arg("--config")
            .arg(self.config.review_config.display().to_string())
            .current_dir(path)
            .capture_stdout()
    }

    /// Review one directory.
    ///
    /// # Errors
    /// Propagates backend spawn and I/O errors.
    pub async fn review_one(&self, path: PathBuf) -> Result<ReviewOutcome, ExecutorError> {
        let output = self
            .backend
            .execute(&self.invocation(path.clone()), self.config.review_timeout)
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout == CLEAN_OUTPUT {
            return Ok(ReviewOutcome::Clean);
        }
        let output = if output.success() || !stdout.is_empty() {
            stdout.into_owned()
        } else {
            format!("elm-review did not finish cleanly ({:?})", output.completion)
        };
        Ok(ReviewOutcome::Flagged { path, output })
    }

    /// Review every path, at most `concurrency` at a time.
    ///
    /// Clean directories advance a `count/total` counter in the logs.
    ///
    /// A directory that cannot be reviewed is flagged with the error.
    ///
    /// # Errors
    /// Returns [`ExecutorError::ToolNotFound`] if elm-review is missing, or
    /// [`ExecutorError::TaskFailed`] if a task panics.
    pub async fn run(self: Arc<Self>, paths: Vec<PathBuf>) -> Result<ReviewSummary, ExecutorError> {
        let total = paths.len();
        let clean = Arc::new(AtomicUsize::new(0));
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let mut tasks = JoinSet::new();
        for path in paths {
            let sweep = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            let clean = Arc::clone(&clean);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ExecutorError::TaskFailed(e.to_string()))?;
                let outcome = match sweep.review_one(path.clone()).await {
                    Ok(outcome) => outcome,
                    Err(e @ ExecutorError::ToolNotFound { .. }) => return Err(e),
                    Err(e) => ReviewOutcome::Flagged {
                        output: format!("elm-review could not run: {e}"),
                        path,
                    },
                };
                match &outcome {
                    ReviewOutcome::Clean => {
                        let count = clean.fetch_add(1, Ordering::AcqRel) + 1;
                        tracing::info!("{count:5}/{total}");
                    }
                    ReviewOutcome::Flagged { path, .. } => {
                        tracing::warn!(path = %path.display(), "elm-review reported findings");
                    }
                }
                Ok::<_, ExecutorError>(outcome)
            });
        }

        let mut summary = ReviewSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| ExecutorError::TaskFailed(e.to_string()))?? {
                ReviewOutcome::Clean => summary.clean += 1,
                ReviewOutcome::Flagged { path, output } => summary.flagged.push((path, output)),
            }
        }
        Ok(summary)
    }
}
