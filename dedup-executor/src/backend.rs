//! Command execution backend abstraction.
//!
//! Allows swapping real process spawning for a scripted backend without
//! changing the harvesting, testing or review logic.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::ExecutorError;

/// A program to run, with its arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Invocation {
    /// Program name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory.
    pub current_dir: PathBuf,
    /// Capture stdout instead of discarding it.
    pub capture_stdout: bool,
}

impl Invocation {
    /// Run `program` in the current directory with output discarded.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: PathBuf::from("."),
            capture_stdout: false,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = dir.into();
        self
    }

    /// Capture stdout.
    #[must_use]
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Completion {
    /// The process exited on its own.
    Exited {
        /// Whether the exit status was success.
        success: bool,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
    },
    /// The time budget elapsed and the process was killed.
    TimedOut,
}

/// Output of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// How the process ended.
    pub completion: Completion,
    /// Captured stdout; empty unless capture was requested.
    pub stdout: Vec<u8>,
    /// Wall-clock time until exit or kill.
    pub elapsed: Duration,
}

impl ExecutionOutput {
    /// Returns `true` if the process exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self.completion, Completion::Exited { success: true, .. })
    }
}

/// Process execution abstraction.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Cancel Safety
/// `execute` must not leak processes: dropping the future kills the child.
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Run an invocation to completion or until `timeout` elapses.
    ///
    /// A timeout is not an error: the child is killed and
    /// [`Completion::TimedOut`] is returned.
    ///
    /// # Errors
    /// Returns [`ExecutorError::ToolNotFound`] if the program does not exist,
    /// [`ExecutorError::SpawnFailed`] if it cannot be started, or
    /// [`ExecutorError::Io`] on I/O failure while waiting.
    async fn execute(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<ExecutionOutput, ExecutorError>;

    /// Check that `program` can be launched.
    ///
    /// # Errors
    /// Returns [`ExecutorError::ToolNotFound`] if it is not available.
    async fn health_check(&self, program: &str) -> Result<(), ExecutorError>;
}
