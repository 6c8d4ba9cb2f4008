//! pdfjoin - Validate, merge and store batches of uploaded PDF files.
//!
//! The library turns an ordered batch of uploads into one stored PDF:
//!
//! - Per-file validation (MIME type, size cap) with skip reasons
//! - Order-preserving merge of the valid files
//! - Storage on local disk or in an S3-compatible bucket
//! - Guaranteed removal of every temporary upload, on success and failure
//!
//! # Examples
//!
//! ```no_run
//! use pdfjoin::pipeline::run_merge_pipeline;
//! use pdfjoin::storage::LocalStorage;
//! use pdfjoin::upload::UploadedFile;
//! use pdfjoin::validation::ValidationPolicy;
//!
//! # async fn example() -> pdfjoin::Result<()> {
//! let storage = LocalStorage::new("merged", "/merged".to_string()).await?;
//! let files = vec![
//!     UploadedFile::new("uploads/3f2a", "intro.pdf", "application/pdf", 48_213),
//!     UploadedFile::new("uploads/9c1b", "body.pdf", "application/pdf", 310_004),
//! ];
//!
//! let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default()).await?;
//! println!("Merged PDF at {}", output.url);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod telemetry;
pub mod upload;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{AppConfig, StorageConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{ArrangedBatch, PipelineOutput, arrange_uploads, merge_arranged, run_merge_pipeline};
pub use storage::{MergeStorage, StorageBackend, create_storage};
pub use validation::{SkippedFile, ValidationPolicy, Validator};

use crate::cli::Command;
use crate::output::OutputFormatter;
use crate::upload::UploadStaging;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Execute one command against a resolved configuration.
///
/// Inputs of `merge` and `arrange` are first copied into the uploads
/// directory; the originals are never modified. `process` only accepts
/// paths inside the uploads directory.
pub async fn run(command: Command, config: &AppConfig, formatter: &OutputFormatter) -> Result<()> {
    let staging = UploadStaging::new(&config.uploads_dir, config.policy.max_files);

    match command {
        Command::Merge { inputs } => {
            let storage = open_storage(config).await?;
            let sources = utils::collect_paths_for_patterns(&inputs)?;
            formatter.info(&format!("Merging {} files...", sources.len()));

            let uploads = staging.stage_all(&sources).await?;
            let output = run_merge_pipeline(storage.as_ref(), uploads, &config.policy).await?;
            output::print_merge_output(formatter, &output);
        }
        Command::Arrange { inputs } => {
            let sources = utils::collect_paths_for_patterns(&inputs)?;
            formatter.info(&format!("Validating {} files...", sources.len()));

            let uploads = staging.stage_all(&sources).await?;
            let batch = arrange_uploads(uploads, &config.policy).await?;
            output::print_arranged(formatter, &batch);
        }
        Command::Process { paths, skipped } => {
            if let Some(foreign) = paths.iter().find(|path| staging.is_foreign(path)) {
                return Err(PipelineError::files_unavailable(foreign));
            }

            let storage = open_storage(config).await?;
            formatter.info(&format!("Merging {} files...", paths.len()));

            let output = merge_arranged(storage.as_ref(), paths, skipped).await?;
            output::print_merge_output(formatter, &output);
        }
    }

    Ok(())
}

async fn open_storage(config: &AppConfig) -> Result<std::sync::Arc<dyn MergeStorage>> {
    create_storage(&config.storage)
        .await
        .map_err(|e| PipelineError::invalid_config(e.to_string()))
}
