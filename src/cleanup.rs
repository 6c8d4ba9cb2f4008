//! Best-effort removal of transient upload artifacts.
//!
//! Every local file that belongs to one pipeline invocation is registered
//! with a [`CleanupGuard`] as soon as the invocation starts. The guard is
//! released once the pipeline finishes, whatever the outcome, and each
//! registered file is deleted at most once. Failures are logged and
//! swallowed; they never replace the pipeline's own result.
//!
//! If the owning task is dropped before [`CleanupGuard::release_all`] runs
//! (cancellation, panic), the `Drop` impl removes whatever is still
//! registered using blocking file system calls.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::join_all;

/// Delete one artifact, logging instead of failing.
///
/// Returns `true` when the file was removed by this call. A file that is
/// already gone counts as a failed delete and is only logged.
pub async fn remove_artifact(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed transient file");
            true
        }
        Err(e) => {
            log_removal_failure(path, &e);
            false
        }
    }
}

/// Delete several artifacts concurrently. Returns how many were removed.
pub async fn remove_artifacts<'a, I>(paths: I) -> usize
where
    I: IntoIterator<Item = &'a Path>,
{
    join_all(paths.into_iter().map(|path| remove_artifact(path)))
        .await
        .into_iter()
        .filter(|removed| *removed)
        .count()
}

fn log_removal_failure(path: &Path, err: &io::Error) {
    tracing::warn!(
        path = %path.display(),
        error = %err,
        "Failed to delete transient file"
    );
}

/// Per-invocation set of transient files awaiting deletion.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    pending: Vec<PathBuf>,
}

impl CleanupGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a guard that already tracks `paths`.
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut guard = Self::new();
        for path in paths {
            guard.register(path);
        }
        guard
    }

    /// Track a file for deletion. Registering the same path twice is a no-op.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.pending.contains(&path) {
            self.pending.push(path);
        }
    }

    /// Stop tracking `path` without deleting it.
    ///
    /// Used when a file must outlive the invocation (staged for a later
    /// merge). Returns `false` if the path was not tracked.
    pub fn keep(&mut self, path: &Path) -> bool {
        match self.pending.iter().position(|p| p == path) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Delete the given tracked files now and stop tracking them.
    ///
    /// Paths that are not tracked are ignored so nothing is deleted twice.
    pub async fn release<'a, I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut due = Vec::new();
        for path in paths {
            if self.keep(path) {
                due.push(path.to_path_buf());
            }
        }
        remove_artifacts(due.iter().map(PathBuf::as_path)).await
    }

    /// Delete every tracked file. The guard is empty afterwards.
    pub async fn release_all(&mut self) -> usize {
        let due = std::mem::take(&mut self.pending);
        if due.is_empty() {
            return 0;
        }

        let removed = remove_artifacts(due.iter().map(PathBuf::as_path)).await;
        tracing::debug!(
            removed,
            requested = due.len(),
            "Released transient files"
        );
        removed
    }

    /// Files still awaiting deletion.
    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in self.pending.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                log_removal_failure(&path, &e);
            }
        }
    }
}
