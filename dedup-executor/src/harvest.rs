//! Package index download and shallow cloning of every published version.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dedup_core::ElmPackage;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::backend::{CommandBackend, Completion, Invocation};
use crate::config::HarnessConfig;
use crate::ExecutorError;

/// Fetch and decode the package index at `url`.
///
/// # Errors
/// Returns [`ExecutorError::Index`] if the request fails, the server answers
/// with an error status, or the body is not a list of packages.
pub async fn fetch_index(client: &reqwest::Client, url: &str) -> Result<Vec<ElmPackage>, ExecutorError> {
    tracing::info!(url, "fetching package index");
    let packages: Vec<ElmPackage> = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    tracing::info!(count = packages.len(), "package index fetched");
    Ok(packages)
}

/// Outcome of cloning one package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    /// Freshly cloned.
    Cloned,
    /// The version directory already existed.
    AlreadyPresent,
    /// The clone failed or the name was invalid.
    Error,
}

/// Tally of a harvest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneSummary {
    /// Versions cloned in this run.
    pub cloned: usize,
    /// Versions that failed.
    pub errored: usize,
    /// Versions already on disk.
    pub already_present: usize,
}

impl CloneSummary {
    /// Count one outcome.
    pub fn add(&mut self, status: CloneStatus) {
        match status {
            CloneStatus::Cloned => self.cloned += 1,
            CloneStatus::Error => self.errored += 1,
            CloneStatus::AlreadyPresent => self.already_present += 1,
        }
    }
}

impl FromIterator<CloneStatus> for CloneSummary {
    fn from_iter<I: IntoIterator<Item = CloneStatus>>(iter: I) -> Self {
        let mut summary = Self::default();
        for status in iter {
            summary.add(status);
        }
        summary
    }
}

impl fmt::Display for CloneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cloned {}, errored {}, already present {}",
            self.cloned, self.errored, self.already_present
        )
    }
}

/// Clones package versions below the repositories root.
pub struct Harvester<B: CommandBackend> {
    backend: B,
    config: HarnessConfig,
}

impl<B: CommandBackend + 'static> Harvester<B> {
    /// Create a harvester cloning with `backend`.
    #[must_use]
    pub fn new(backend: B, config: HarnessConfig) -> Self {
        Self { backend, config }
    }

    /// Target directory of `package`.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Core`] if the registry name is malformed.
    pub fn target_dir(&self, package: &ElmPackage) -> Result<PathBuf, ExecutorError> {
        Ok(self.config.repos_root.join(package.relative_dir()?))
    }

    /// Shallow-clone the tag of one package version unless it is on disk.
    ///
    /// Failures are logged and reported as [`CloneStatus::Error`].
    pub async fn clone_one(&self, package: &ElmPackage) -> CloneStatus {
        match self.try_clone(package).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(package = %package, error = %e, "clone failed");
                CloneStatus::Error
            }
        }
    }

    async fn try_clone(&self, package: &ElmPackage) -> Result<CloneStatus, ExecutorError> {
        let target = self.target_dir(package)?;
        if tokio::fs::try_exists(&target).await? {
            return Ok(CloneStatus::AlreadyPresent);
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!(package = %package, "cloning");
        let output = self
            .backend
            .execute(&self.clone_invocation(package, &target), self.config.clone_timeout)
            .await?;

        match output.completion {
            Completion::Exited { success: true, .. } => return Ok(CloneStatus::Cloned),
            Completion::Exited { code, .. } => {
                tracing::error!(package = %package, ?code, "git clone failed");
            }
            Completion::TimedOut => {
                tracing::error!(package = %package, "git clone timed out");
            }
        }
        // A partial checkout would count as already present on the next run.
        Self::discard_partial(&target).await?;
        Ok(CloneStatus::Error)
    }

    async fn discard_partial(target: &Path) -> Result<(), ExecutorError> {
        match tokio::fs::remove_dir_all(target).await {
            Ok(()) => {
                tracing::debug!(target = %target.display(), "partial checkout removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `git clone` invocation for one package version.
    #[must_use]
    pub fn clone_invocation(&self, package: &ElmPackage, target: &Path) -> Invocation {
        Invocation::new("git").args([
            "clone".to_owned(),
            "--quiet".to_owned(),
            "--branch".to_owned(),
            package.version.clone(),
            "--depth".to_owned(),
            "1".to_owned(),
            self.config.clone_url(&package.name),
            target.display().to_string(),
        ])
    }

    /// Clone every package, at most `concurrency` at a time.
    ///
    /// # Errors
    /// Returns [`ExecutorError::TaskFailed`] if a clone task panics.
    pub async fn clone_all(self: Arc<Self>, packages: Vec<ElmPackage>) -> Result<CloneSummary, ExecutorError> {
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for package in packages {
            let harvester = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ExecutorError::TaskFailed(e.to_string()))?;
                Ok::<_, ExecutorError>(harvester.clone_one(&package).await)
            });
        }

        let mut summary = CloneSummary::default();
        while let Some(joined) = tasks.join_next().await {
            summary.add(joined.map_err(|e| ExecutorError::TaskFailed(e.to_string()))??);
        }
        tracing::info!(%summary, "harvest complete");
        Ok(summary)
    }
}
