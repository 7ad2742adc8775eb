//! Nix support for elm-dedup environment declarations.
//!
//! Renders environment and sandbox declarations as Nix expressions,
//! checks profile scripts, and hands the result to the external tooling
//! through the [`Provisioner`] seam.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod profile;
pub mod provisioner;
pub mod render;

pub use error::NixError;
pub use profile::validate_profile_script;
pub use provisioner::{DeclarationKind, EntryCommand, Materialized, NixProvisioner, Provisioner};
pub use render::{nix_string, render_environment, render_sandbox};
