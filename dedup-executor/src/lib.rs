//! Process execution for the elm-dedup harness.
//!
//! Clones every published Elm package, runs each test suite with the
//! reference compiler and the Lamdera variants, and sweeps the checkouts
//! with `elm-review`. All external programs go through the
//! [`CommandBackend`] seam.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod board;
pub mod config;
pub mod error;
pub mod export;
pub mod harvest;
pub mod orchestrator;
pub mod process;
pub mod review;
pub mod runner;
pub mod walker;

pub use backend::{CommandBackend, Completion, ExecutionOutput, Invocation};
pub use board::{ProgressBoard, Summary};
pub use config::{Compilers, HarnessConfig};
pub use error::ExecutorError;
pub use export::{export_to_path, write_csv};
pub use harvest::{fetch_index, CloneStatus, CloneSummary, Harvester};
pub use orchestrator::TestOrchestrator;
pub use process::ProcessBackend;
pub use review::{ReviewOutcome, ReviewSummary, ReviewSweep};
pub use runner::SuiteRunner;
pub use walker::{discover_suites, version_roots};
