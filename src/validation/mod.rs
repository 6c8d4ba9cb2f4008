//! Upload batch validation.
//!
//! The validator partitions a raw batch into files that may be merged and
//! files that are skipped, with a human-readable reason for each skip:
//!
//! - wrong MIME type: `"Not a PDF file"`
//! - over the size cap: `"Too large: 9.00MB (max 5MB)"`
//!
//! Skipped uploads are deleted right away. When fewer than
//! [`ValidationPolicy::min_valid_files`] remain, the valid uploads are
//! deleted too and [`PipelineError::InsufficientValidFiles`] is returned.
//!
//! # Examples
//!
//! ```no_run
//! use pdfjoin::cleanup::CleanupGuard;
//! use pdfjoin::upload::UploadedFile;
//! use pdfjoin::validation::{ValidationPolicy, Validator};
//!
//! # async fn example(files: Vec<UploadedFile>) -> pdfjoin::Result<()> {
//! let validator = Validator::new(ValidationPolicy::default());
//! let mut cleanup = CleanupGuard::with_paths(files.iter().map(|f| f.local_path.clone()));
//! let outcome = validator.validate(files, &mut cleanup).await?;
//! println!("{} files ready to merge", outcome.valid_files.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupGuard;
use crate::error::{PipelineError, Result};
use crate::upload::{PDF_MIME_TYPE, UploadedFile};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Rules applied to every upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPolicy {
    /// Largest accepted file, in bytes.
    pub max_file_size_bytes: u64,

    /// MIME type every file must carry.
    pub required_mime_type: String,

    /// Minimum number of valid files needed for a merge.
    pub min_valid_files: usize,

    /// Maximum files per batch; enforced at ingestion.
    pub max_files: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * BYTES_PER_MB,
            required_mime_type: PDF_MIME_TYPE.to_string(),
            min_valid_files: 2,
            max_files: 10,
        }
    }
}

impl ValidationPolicy {
    /// Policy with a size cap given in whole megabytes.
    pub fn with_max_file_size_mb(mut self, megabytes: u64) -> Self {
        self.max_file_size_bytes = megabytes * BYTES_PER_MB;
        self
    }

    /// Size cap formatted for messages: `"5"` for whole megabytes, `"2.50"` otherwise.
    pub fn max_file_size_label(&self) -> String {
        if self.max_file_size_bytes % BYTES_PER_MB == 0 {
            (self.max_file_size_bytes / BYTES_PER_MB).to_string()
        } else {
            format!("{:.2}", self.max_file_size_bytes as f64 / BYTES_PER_MB as f64)
        }
    }
}

/// Why a file was left out of the merge.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// MIME type did not match the policy.
    NotPdf,
    /// Declared size exceeded the policy cap.
    TooLarge {
        /// Declared size in megabytes.
        size_mb: f64,
        /// Formatted cap, see [`ValidationPolicy::max_file_size_label`].
        max_label: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPdf => write!(f, "Not a PDF file"),
            Self::TooLarge { size_mb, max_label } => {
                write!(f, "Too large: {size_mb:.2}MB (max {max_label}MB)")
            }
        }
    }
}

/// A file rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    /// File name as sent by the client.
    pub original_name: String,

    /// Human-readable reason.
    pub reason: String,
}

impl SkippedFile {
    /// Create a skipped entry from a typed reason.
    pub fn new(original_name: impl Into<String>, reason: &SkipReason) -> Self {
        Self {
            original_name: original_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Render as `"name (reason)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.original_name, self.reason)
    }
}

/// Partition of a batch into mergeable and skipped files.
///
/// Both lists keep input order; the order of `valid_files` is the page order
/// of the merged document.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Files that passed every check.
    pub valid_files: Vec<UploadedFile>,

    /// Files that failed a check.
    pub skipped: Vec<SkippedFile>,

    skipped_paths: Vec<std::path::PathBuf>,
}

impl ValidationOutcome {
    /// Total number of files the outcome accounts for.
    pub fn total(&self) -> usize {
        self.valid_files.len() + self.skipped.len()
    }
}

/// Batch validator.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    /// Create a validator enforcing `policy`.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// The policy being enforced.
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Check a single file against the policy.
    pub fn check(&self, file: &UploadedFile) -> std::result::Result<(), SkipReason> {
        if file.mime_type != self.policy.required_mime_type {
            return Err(SkipReason::NotPdf);
        }

        if file.declared_size > self.policy.max_file_size_bytes {
            return Err(SkipReason::TooLarge {
                size_mb: file.size_mb(),
                max_label: self.policy.max_file_size_label(),
            });
        }

        Ok(())
    }

    /// Partition a batch without touching the file system.
    pub fn partition(&self, files: Vec<UploadedFile>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for file in files {
            match self.check(&file) {
                Ok(()) => outcome.valid_files.push(file),
                Err(reason) => {
                    tracing::info!(
                        file = %file.original_name,
                        reason = %reason,
                        "Skipping upload"
                    );
                    outcome
                        .skipped
                        .push(SkippedFile::new(&file.original_name, &reason));
                    outcome.skipped_paths.push(file.local_path);
                }
            }
        }

        outcome
    }

    /// Validate a batch and delete what will not be merged.
    ///
    /// Every file of the batch is registered with `cleanup`. Skipped files
    /// are released immediately; if too few valid files remain they are
    /// released as well and `InsufficientValidFiles` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientValidFiles`] when fewer than
    /// `min_valid_files` files pass.
    pub async fn validate(
        &self,
        files: Vec<UploadedFile>,
        cleanup: &mut CleanupGuard,
    ) -> Result<ValidationOutcome> {
        for file in &files {
            cleanup.register(&file.local_path);
        }

        let outcome = self.partition(files);
        cleanup
            .release(outcome.skipped_paths.iter().map(|p| p.as_path()))
            .await;

        if outcome.valid_files.len() < self.policy.min_valid_files {
            cleanup
                .release(outcome.valid_files.iter().map(|f| f.local_path.as_path()))
                .await;

            tracing::info!(
                valid = outcome.valid_files.len(),
                skipped = outcome.skipped.len(),
                required = self.policy.min_valid_files,
                "Not enough valid files to merge"
            );

            return Err(PipelineError::insufficient_valid_files(
                self.policy.min_valid_files,
                outcome.skipped,
            ));
        }

        Ok(outcome)
    }
}
