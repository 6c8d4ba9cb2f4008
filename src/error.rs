//! Error types for pdfjoin.
//!
//! Every failure that can leave the merge pipeline is expressed as a
//! [`PipelineError`]. Lower layers (storage, PDF parsing, file system) are
//! wrapped before they cross the pipeline boundary.
//!
//! # Error Categories
//!
//! - **Validation Errors**: empty batches, too few valid files, stale paths
//! - **Merge Errors**: malformed PDF input
//! - **Storage Errors**: disk writes or object-store puts that failed
//! - **Configuration Errors**: invalid startup settings

use std::path::PathBuf;

use crate::storage::StorageError;
use crate::validation::SkippedFile;

/// Result type alias for pdfjoin operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Message shown to users for failures whose details must stay internal.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while merging your files. Please try again.";

/// Main error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The upload batch was empty.
    #[error("Please select files to upload.")]
    NoFilesUploaded,

    /// More files were submitted than the ingestion limit allows.
    #[error("Too many files: {count} (max {max})")]
    TooManyFiles {
        /// Number of submitted files.
        count: usize,
        /// Configured limit.
        max: usize,
    },

    /// Fewer valid files than required remained after validation.
    #[error("You need at least {required} valid PDF files to merge ({} skipped)", .skipped.len())]
    InsufficientValidFiles {
        /// Minimum number of valid files.
        required: usize,
        /// Files rejected by validation, in input order.
        skipped: Vec<SkippedFile>,
    },

    /// A previously staged file is no longer accessible.
    #[error("Some files are no longer available: {}", .path.display())]
    FilesUnavailable {
        /// The first path found missing.
        path: PathBuf,
    },

    /// The merge capability rejected the input documents.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Persisting the merged document failed.
    #[error("Storage operation failed: {0}")]
    StorageFailed(#[from] StorageError),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },
}

impl From<lopdf::Error> for PipelineError {
    fn from(err: lopdf::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::merge_failed(format!("merge task did not complete: {err}"))
    }
}

impl PipelineError {
    /// Create an InsufficientValidFiles error.
    pub fn insufficient_valid_files(required: usize, skipped: Vec<SkippedFile>) -> Self {
        Self::InsufficientValidFiles { required, skipped }
    }

    /// Create a FilesUnavailable error.
    pub fn files_unavailable(path: impl Into<PathBuf>) -> Self {
        Self::FilesUnavailable { path: path.into() }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Files skipped during validation, when the error carries them.
    pub fn skipped_files(&self) -> &[SkippedFile] {
        match self {
            Self::InsufficientValidFiles { skipped, .. } => skipped,
            _ => &[],
        }
    }

    /// Check if this error is caused by user input rather than the system.
    ///
    /// Recoverable errors are reported with their full message; the user can
    /// fix the batch and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoFilesUploaded
                | Self::TooManyFiles { .. }
                | Self::InsufficientValidFiles { .. }
                | Self::FilesUnavailable { .. }
        )
    }

    /// Message suitable for the person who submitted the batch.
    ///
    /// Merge and storage failures are reduced to a generic message so that
    /// implementation details never reach the caller.
    pub fn user_message(&self) -> String {
        match self {
            Self::MergeFailed { .. } | Self::StorageFailed(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            Self::FilesUnavailable { .. } => {
                "Some files are no longer available. Please upload again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoFilesUploaded => 1,
            Self::TooManyFiles { .. } => 1,
            Self::InsufficientValidFiles { .. } => 1,
            Self::FilesUnavailable { .. } => 2,
            Self::MergeFailed { .. } => 6,
            Self::StorageFailed(_) => 5,
            Self::InvalidConfig { .. } => 1,
        }
    }
}
