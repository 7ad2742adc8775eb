//! Provisioning seam to the external package manager.
//!
//! A [`Provisioner`] turns declarations into files the external tool can
//! consume and launches the resulting shell. Only the description is owned
//! here; resolution, fetching and namespace setup belong to the tool.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dedup_core::{EnvironmentSpec, SandboxSpec, SpecDigest};
use tokio::process::Command;

use crate::profile::validate_profile_script;
use crate::render::{render_environment, render_sandbox};
use crate::NixError;

/// What a materialized declaration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeclarationKind {
    /// A development environment module.
    Environment,
    /// A sandboxed FHS shell.
    Sandbox,
}

/// The command that enters a materialized declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct EntryCommand {
    /// Program to launch.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory of the launched program.
    pub current_dir: PathBuf,
}

impl fmt::Display for EntryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.current_dir.display().to_string();
        write!(f, "cd {} && {}", sh_quote(&dir), sh_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", sh_quote(arg))?;
        }
        Ok(())
    }
}

/// Quote `raw` for a POSIX shell unless it only holds unambiguous characters.
fn sh_quote(raw: &str) -> String {
    if raw.is_empty() {
        return "''".to_owned();
    }
    let safe = raw
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '@' | '+' | '='));
    if safe {
        raw.to_owned()
    } else {
        format!("'{}'", raw.replace('\'', "'\\''"))
    }
}

/// A declaration written to disk and ready to be entered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Materialized {
    /// Which kind of declaration this is.
    pub kind: DeclarationKind,
    /// Path of the rendered expression.
    pub path: PathBuf,
    /// Digest of the rendered expression.
    pub digest: SpecDigest,
    /// How to enter it.
    pub entry: EntryCommand,
}

/// External provisioning tool abstraction.
///
/// # Cancel Safety
/// `materialize_*` only write files and are cancel safe. Dropping the
/// future returned by `enter` kills the launched program.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Check that the external tooling is installed.
    ///
    /// # Errors
    /// Returns [`NixError::ToolNotFound`] if a required tool is missing.
    async fn health_check(&self) -> Result<(), NixError>;

    /// Write an environment declaration for the external tool.
    ///
    /// # Errors
    /// Returns [`NixError::Io`] if the declaration cannot be written.
    async fn materialize_environment(&self, env: &EnvironmentSpec) -> Result<Materialized, NixError>;

    /// Write a sandbox declaration for the external tool.
    ///
    /// # Errors
    /// Returns [`NixError::ProfileSyntax`] if the profile does not parse, or
    /// [`NixError::Io`] if the declaration cannot be written.
    async fn materialize_sandbox(&self, spec: &SandboxSpec) -> Result<Materialized, NixError>;

    /// Launch the entry command interactively and wait for it to exit.
    ///
    /// Returns the exit code of the launched program.
    ///
    /// # Errors
    /// Returns [`NixError::ToolNotFound`] if the entry program is missing.
    async fn enter(&self, materialized: &Materialized) -> Result<i32, NixError>;
}

/// Provisioner backed by `nix-shell` (sandboxes) and `devenv` (environments).
#[derive(Debug, Clone)]
pub struct NixProvisioner {
    /// Directory where rendered expressions are written.
    state_dir: PathBuf,
    /// Program used to enter sandboxes.
    nix_shell: String,
    /// Program used to enter environments.
    devenv: String,
}

impl NixProvisioner {
    /// Create a provisioner writing into `state_dir`.
    #[must_use]
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            nix_shell: "nix-shell".to_owned(),
            devenv: "devenv".to_owned(),
        }
    }

    /// Override the programs used to enter declarations.
    #[must_use]
    pub fn with_programs(mut self, nix_shell: impl Into<String>, devenv: impl Into<String>) -> Self {
        self.nix_shell = nix_shell.into();
        self.devenv = devenv.into();
        self
    }

    /// Directory where rendered expressions are written.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Create the state directory and return its absolute path.
    ///
    /// Entry commands run inside the state directory, so every path they
    /// receive must be absolute.
    async fn prepare_state_dir(&self) -> Result<PathBuf, NixError> {
        tokio::fs::create_dir_all(&self.state_dir).await?;
        Ok(tokio::fs::canonicalize(&self.state_dir).await?)
    }

    /// Write `contents` to `path` unless it already holds exactly that.
    async fn write_if_changed(path: &Path, contents: &str) -> Result<(), NixError> {
        if let Ok(existing) = tokio::fs::read_to_string(path).await {
            if existing == contents {
                tracing::debug!(path = %path.display(), "declaration unchanged");
                return Ok(());
            }
        }
        tokio::fs::write(path, contents).await?;
        tracing::info!(path = %path.display(), "declaration written");
        Ok(())
    }
}

#[async_trait]
impl Provisioner for NixProvisioner {
    async fn health_check(&self) -> Result<(), NixError> {
        require_tool(&self.nix_shell)
    }

    async fn materialize_environment(&self, env: &EnvironmentSpec) -> Result<Materialized, NixError> {
        let state_dir = self.prepare_state_dir().await?;
        let rendered = render_environment(env);
        let path = state_dir.join("devenv.nix");
        Self::write_if_changed(&path, &rendered).await?;

        Ok(Materialized {
            kind: DeclarationKind::Environment,
            digest: SpecDigest::of(rendered.as_bytes()),
            entry: EntryCommand {
                program: self.devenv.clone(),
                args: vec!["shell".to_owned()],
                current_dir: state_dir,
            },
            path,
        })
    }

    async fn materialize_sandbox(&self, spec: &SandboxSpec) -> Result<Materialized, NixError> {
        validate_profile_script(&spec.profile_script).await?;

        let state_dir = self.prepare_state_dir().await?;
        let rendered = render_sandbox(spec);
        let path = state_dir.join(format!("{}.nix", spec.name));
        Self::write_if_changed(&path, &rendered).await?;

        Ok(Materialized {
            kind: DeclarationKind::Sandbox,
            digest: SpecDigest::of(rendered.as_bytes()),
            entry: EntryCommand {
                program: self.nix_shell.clone(),
                args: vec![path.display().to_string()],
                current_dir: state_dir,
            },
            path,
        })
    }

    async fn enter(&self, materialized: &Materialized) -> Result<i32, NixError> {
        let entry = &materialized.entry;
        require_tool(&entry.program)?;

        tracing::info!(command = %entry, digest = %materialized.digest, "entering shell");

        let status = Command::new(&entry.program)
            .args(&entry.args)
            .current_dir(&entry.current_dir)
            .kill_on_drop(true)
            .status()
            .await?;

        // Killed by a signal: report like a shell does.
        let code = status.code().unwrap_or(128);
        tracing::info!(code, "shell exited");
        Ok(code)
    }
}

fn require_tool(program: &str) -> Result<(), NixError> {
    which::which(program).map(|_| ()).map_err(|_| NixError::ToolNotFound {
        tool: program.to_owned(),
    })
}
