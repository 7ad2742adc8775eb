//! Discovery of checked-out package versions below the repositories root.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ExecutorError;

/// Every `<author>/<package>/<version>` directory below `root`, sorted.
///
/// A missing `root` yields an empty list.
///
/// # Errors
/// Returns [`ExecutorError::Io`] if a directory cannot be read.
pub async fn version_roots(root: &Path) -> Result<Vec<PathBuf>, ExecutorError> {
    collect_roots(root, &AtomicBool::new(false)).await
}

/// Version roots that hold a test suite: a `tests/` directory and an
/// `elm.json`. Stops early once `stop` is set.
///
/// # Errors
/// Returns [`ExecutorError::Io`] if a directory cannot be read.
pub async fn discover_suites(root: &Path, stop: &AtomicBool) -> Result<Vec<PathBuf>, ExecutorError> {
    let mut suites = Vec::new();
    for version_root in collect_roots(root, stop).await? {
        if stop.load(Ordering::Acquire) {
            break;
        }
        if is_suite(&version_root).await? {
            suites.push(version_root);
        }
    }
    tracing::debug!(root = %root.display(), count = suites.len(), "suites discovered");
    Ok(suites)
}

async fn is_suite(version_root: &Path) -> Result<bool, ExecutorError> {
    let tests = tokio::fs::metadata(version_root.join("tests")).await;
    let has_tests = matches!(tests, Ok(meta) if meta.is_dir());
    Ok(has_tests && tokio::fs::try_exists(version_root.join("elm.json")).await?)
}

async fn collect_roots(root: &Path, stop: &AtomicBool) -> Result<Vec<PathBuf>, ExecutorError> {
    if !tokio::fs::try_exists(root).await? {
        tracing::warn!(root = %root.display(), "repositories root does not exist");
        return Ok(Vec::new());
    }
    let mut roots = Vec::new();
    for author in sorted_subdirs(root).await? {
        for package in sorted_subdirs(&author).await? {
            if stop.load(Ordering::Acquire) {
                return Ok(roots);
            }
            roots.extend(sorted_subdirs(&package).await?);
        }
    }
    Ok(roots)
}

async fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, ExecutorError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
