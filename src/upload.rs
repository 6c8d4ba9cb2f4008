//! Uploaded file records and local staging.
//!
//! The pipeline consumes [`UploadedFile`] records as produced by an upload
//! decoder. [`UploadStaging`] is the decoder used by the command-line front
//! end: it copies each input into the uploads directory under a random name,
//! so the pipeline can delete its copies without touching the originals.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupGuard;
use crate::error::{PipelineError, Result};

/// MIME type accepted by the default validation policy.
pub const PDF_MIME_TYPE: &str = "application/pdf";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One file received from the upload decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Where the decoder stored the upload on local disk.
    pub local_path: PathBuf,

    /// File name as sent by the client.
    pub original_name: String,

    /// MIME type as reported by the client.
    pub mime_type: String,

    /// Size in bytes as reported by the decoder.
    pub declared_size: u64,
}

impl UploadedFile {
    /// Create a new upload record.
    pub fn new(
        local_path: impl Into<PathBuf>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        declared_size: u64,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            declared_size,
        }
    }

    /// Declared size in megabytes.
    pub fn size_mb(&self) -> f64 {
        self.declared_size as f64 / BYTES_PER_MB
    }

    /// Declared size formatted as `"1.50 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_mb())
    }
}

/// Guess a MIME type from a file extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => PDF_MIME_TYPE,
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Copies input files into the uploads directory, like a multipart decoder
/// writing request parts to disk.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    uploads_dir: PathBuf,
    max_files: usize,
}

impl UploadStaging {
    /// Create a staging area in `uploads_dir` accepting at most `max_files` per batch.
    pub fn new(uploads_dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_files,
        }
    }

    /// Directory staged uploads are written to.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Whether `path` exists but lies outside the uploads directory.
    ///
    /// Such paths were never staged by this process and must not be handed
    /// to a flow that deletes its inputs.
    pub fn is_foreign(&self, path: &Path) -> bool {
        let Ok(file) = std::fs::canonicalize(path) else {
            return false;
        };
        match std::fs::canonicalize(&self.uploads_dir) {
            Ok(dir) => !file.starts_with(dir),
            Err(_) => true,
        }
    }

    /// Stage a single file.
    ///
    /// # Errors
    ///
    /// Returns `FilesUnavailable` if the source cannot be read or copied.
    pub async fn stage(&self, source: &Path) -> Result<UploadedFile> {
        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| {
                PipelineError::invalid_config(format!(
                    "Cannot create uploads directory {}: {}",
                    self.uploads_dir.display(),
                    e
                ))
            })?;

        let metadata = tokio::fs::metadata(source)
            .await
            .map_err(|_| PipelineError::files_unavailable(source))?;
        if !metadata.is_file() {
            return Err(PipelineError::files_unavailable(source));
        }

        let staged = self.uploads_dir.join(uuid::Uuid::new_v4().simple().to_string());
        tokio::fs::copy(source, &staged)
            .await
            .map_err(|_| PipelineError::files_unavailable(source))?;

        let original_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());

        tracing::debug!(
            source = %source.display(),
            staged = %staged.display(),
            size_bytes = metadata.len(),
            "Staged upload"
        );

        Ok(UploadedFile::new(
            staged,
            original_name,
            mime_type_for_path(source),
            metadata.len(),
        ))
    }

    /// Stage a whole batch, in order.
    ///
    /// Batches larger than `max_files` are rejected before anything is
    /// copied. If one file fails, the copies made so far are removed.
    pub async fn stage_all(&self, sources: &[PathBuf]) -> Result<Vec<UploadedFile>> {
        if sources.len() > self.max_files {
            return Err(PipelineError::TooManyFiles {
                count: sources.len(),
                max: self.max_files,
            });
        }

        let mut cleanup = CleanupGuard::new();
        let mut staged = Vec::with_capacity(sources.len());

        for source in sources {
            match self.stage(source).await {
                Ok(file) => {
                    cleanup.register(&file.local_path);
                    staged.push(file);
                }
                Err(e) => {
                    cleanup.release_all().await;
                    return Err(e);
                }
            }
        }

        // Ownership of the copies passes to the caller.
        for file in &staged {
            cleanup.keep(&file.local_path);
        }

        Ok(staged)
    }
}
