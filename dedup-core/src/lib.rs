//! Core types for the elm-dedup project.
//!
//! Defines the environment declarations (development environment and
//! sandboxed FHS shell) and the domain of the cross-compiler test harness:
//! registry packages, test framework versions, compilers and run results.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod declarations;
pub mod digest;
pub mod elm;
pub mod environment;
pub mod error;
pub mod package;
pub mod results;
pub mod sandbox;

pub use digest::SpecDigest;
pub use elm::{CompilerKind, ElmPackage, ElmTestVersion};
pub use environment::EnvironmentSpec;
pub use error::CoreError;
pub use package::{CustomOutput, OutputKind, PackageName, ToolchainId};
pub use results::{RunResult, RunResults, SuiteReport};
pub use sandbox::{SandboxDescription, SandboxMember, SandboxSpec, SandboxSpecBuilder};
