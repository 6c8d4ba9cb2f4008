//! End-to-end merge flows exposed to the presentation layer.
//!
//! - [`run_merge_pipeline`]: validate an upload batch, merge it, store it
//! - [`arrange_uploads`]: validate a batch and stage the valid files so the
//!   caller can pick the merge order
//! - [`merge_arranged`]: merge previously staged files in a chosen order
//!
//! Every flow registers the local files it owns with a [`CleanupGuard`] up
//! front and releases the guard after the flow body returns, on success and
//! failure alike.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupGuard;
use crate::error::{PipelineError, Result};
use crate::merge::{MIN_MERGE_SOURCES, MergeSource, merge_files};
use crate::storage::MergeStorage;
use crate::upload::UploadedFile;
use crate::validation::{SkippedFile, ValidationPolicy, Validator};

/// Outcome of a successful merge, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// Identifier of the merged document.
    pub identifier: u64,

    /// Backend-specific key of the merged document.
    pub storage_key: String,

    /// URL of the merged document.
    pub url: String,

    /// Files left out of the merge.
    pub skipped_files: Vec<SkippedFile>,
}

impl PipelineOutput {
    /// Skipped files rendered as `"name (reason)"`.
    pub fn skipped_labels(&self) -> Vec<String> {
        self.skipped_files.iter().map(SkippedFile::label).collect()
    }
}

/// A validated upload kept on disk for a later merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangedFile {
    /// Staged location.
    pub path: PathBuf,

    /// File name as sent by the client.
    pub name: String,

    /// Declared size, e.g. `"1.25 MB"`.
    pub size: String,
}

impl From<&UploadedFile> for ArrangedFile {
    fn from(file: &UploadedFile) -> Self {
        Self {
            path: file.local_path.clone(),
            name: file.original_name.clone(),
            size: file.size_label(),
        }
    }
}

/// Result of [`arrange_uploads`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangedBatch {
    /// Valid files, in upload order.
    pub files: Vec<ArrangedFile>,

    /// Files left out.
    pub skipped: Vec<SkippedFile>,
}

/// Validate, merge and store one upload batch.
///
/// Every file of `raw_files` is gone from local disk when this returns.
///
/// # Errors
///
/// - `NoFilesUploaded` for an empty batch
/// - `InsufficientValidFiles` when fewer than `policy.min_valid_files` pass
/// - `MergeFailed` / `StorageFailed` when the merge or its persistence fails
pub async fn run_merge_pipeline(
    storage: &dyn MergeStorage,
    raw_files: Vec<UploadedFile>,
    policy: &ValidationPolicy,
) -> Result<PipelineOutput> {
    if raw_files.is_empty() {
        return Err(PipelineError::NoFilesUploaded);
    }

    let mut cleanup = CleanupGuard::with_paths(raw_files.iter().map(|f| f.local_path.clone()));
    let result = validate_and_merge(storage, raw_files, policy, &mut cleanup).await;
    cleanup.release_all().await;

    if let Err(ref err) = result {
        log_failure("merge", err);
    }
    result
}

async fn validate_and_merge(
    storage: &dyn MergeStorage,
    raw_files: Vec<UploadedFile>,
    policy: &ValidationPolicy,
    cleanup: &mut CleanupGuard,
) -> Result<PipelineOutput> {
    let outcome = Validator::new(policy.clone())
        .validate(raw_files, cleanup)
        .await?;

    let sources = outcome
        .valid_files
        .iter()
        .map(|file| MergeSource::Path(file.local_path.clone()))
        .collect();

    let merged = merge_files(storage, sources).await?;

    Ok(PipelineOutput {
        identifier: merged.identifier,
        storage_key: merged.storage_key,
        url: merged.public_url,
        skipped_files: outcome.skipped,
    })
}

/// Validate a batch and keep the valid files staged for [`merge_arranged`].
///
/// Skipped files are deleted. If the batch cannot be merged at all, every
/// file is deleted and the validation error is returned.
pub async fn arrange_uploads(
    raw_files: Vec<UploadedFile>,
    policy: &ValidationPolicy,
) -> Result<ArrangedBatch> {
    if raw_files.is_empty() {
        return Err(PipelineError::NoFilesUploaded);
    }

    let mut cleanup = CleanupGuard::with_paths(raw_files.iter().map(|f| f.local_path.clone()));
    let result = Validator::new(policy.clone())
        .validate(raw_files, &mut cleanup)
        .await
        .map(|outcome| {
            for file in &outcome.valid_files {
                cleanup.keep(&file.local_path);
            }
            ArrangedBatch {
                files: outcome.valid_files.iter().map(ArrangedFile::from).collect(),
                skipped: outcome.skipped,
            }
        });
    cleanup.release_all().await;

    match &result {
        Ok(batch) => tracing::info!(
            staged = batch.files.len(),
            skipped = batch.skipped.len(),
            "Uploads arranged"
        ),
        Err(err) => log_failure("arrange", err),
    }
    result
}

/// Merge staged files in exactly the given order.
///
/// The staged files are deleted afterwards, whatever the outcome.
/// `skipped` is carried through to the output unchanged.
///
/// # Errors
///
/// - `InsufficientValidFiles` for fewer than two paths
/// - `FilesUnavailable` if a staged file no longer exists
/// - `MergeFailed` / `StorageFailed` as for [`run_merge_pipeline`]
pub async fn merge_arranged(
    storage: &dyn MergeStorage,
    paths: Vec<PathBuf>,
    skipped: Vec<SkippedFile>,
) -> Result<PipelineOutput> {
    let mut cleanup = CleanupGuard::with_paths(paths.iter().cloned());
    let result = check_and_merge(storage, paths, skipped).await;
    cleanup.release_all().await;

    if let Err(ref err) = result {
        log_failure("process", err);
    }
    result
}

async fn check_and_merge(
    storage: &dyn MergeStorage,
    paths: Vec<PathBuf>,
    skipped: Vec<SkippedFile>,
) -> Result<PipelineOutput> {
    if paths.len() < MIN_MERGE_SOURCES {
        return Err(PipelineError::insufficient_valid_files(
            MIN_MERGE_SOURCES,
            skipped,
        ));
    }

    for path in &paths {
        let available = tokio::fs::try_exists(path).await.unwrap_or(false);
        if !available {
            return Err(PipelineError::files_unavailable(path));
        }
    }

    let sources = paths.into_iter().map(MergeSource::Path).collect();
    let merged = merge_files(storage, sources).await?;

    Ok(PipelineOutput {
        identifier: merged.identifier,
        storage_key: merged.storage_key,
        url: merged.public_url,
        skipped_files: skipped,
    })
}

fn log_failure(flow: &str, err: &PipelineError) {
    if err.is_recoverable() {
        tracing::info!(flow, error = %err, "Batch rejected");
    } else {
        tracing::error!(flow, error = %err, "Batch failed");
    }
}
