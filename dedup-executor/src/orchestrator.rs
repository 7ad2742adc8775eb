//! Worker pool testing discovered suites concurrently.
//!
//! Workers drain a shared queue. Setting the stop flag lets each worker
//! finish its current suite and then exit; results gathered so far are
//! still returned.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dedup_core::SuiteReport;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::board::ProgressBoard;
use crate::runner::SuiteRunner;
use crate::{CommandBackend, ExecutorError};

/// Runs suites through a [`SuiteRunner`] with bounded concurrency.
pub struct TestOrchestrator<B: CommandBackend> {
    runner: Arc<SuiteRunner<B>>,
    board: Arc<ProgressBoard>,
    concurrency: usize,
    stop: Arc<AtomicBool>,
}

impl<B: CommandBackend + 'static> TestOrchestrator<B> {
    /// Create an orchestrator with `concurrency` workers (at least one).
    #[must_use]
    pub fn new(runner: SuiteRunner<B>, concurrency: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            board: Arc::new(ProgressBoard::new()),
            concurrency: concurrency.max(1),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Progress board updated by the workers.
    #[must_use]
    pub fn board(&self) -> Arc<ProgressBoard> {
        Arc::clone(&self.board)
    }

    /// Flag that cancels the run when set.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ask workers to stop after their current suite.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns `true` once [`TestOrchestrator::stop`] was called.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Test every suite and return the finished reports in completion order.
    ///
    /// A suite that cannot be tested is logged and counted as errored; it
    /// does not abort the run.
    ///
    /// # Errors
    /// Returns [`ExecutorError::TaskFailed`] if a worker task panics.
    pub async fn run(&self, suites: Vec<PathBuf>) -> Result<Vec<SuiteReport>, ExecutorError> {
        self.board.enqueue(suites.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(suites)));

        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            let queue = Arc::clone(&queue);
            let runner = Arc::clone(&self.runner);
            let board = Arc::clone(&self.board);
            let stop = Arc::clone(&self.stop);
            workers.spawn(async move {
                loop {
                    if stop.load(Ordering::Acquire) {
                        tracing::debug!(worker, "worker stopping");
                        break;
                    }
                    let Some(path) = queue.lock().await.pop_front() else {
                        break;
                    };
                    board.start(&path);
                    match runner.run_suite(&path).await {
                        Ok(report) => board.finish(report),
                        Err(e) => {
                            tracing::error!(suite = %path.display(), error = %e, "suite abandoned");
                            board.abandon(&path);
                        }
                    }
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| ExecutorError::TaskFailed(e.to_string()))?;
        }

        let remaining = queue.lock().await.len();
        if remaining > 0 {
            tracing::warn!(remaining, "run cancelled before every suite was tested");
        }
        Ok(self.board.reports())
    }
}
