use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{MergeStorage, StorageBackend, StorageError, StorageResult};
use crate::cleanup;

/// Local filesystem storage implementation
///
/// Merged documents are written to `merged_dir` and served by an external
/// static file handler mounted at `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    merged_dir: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating `merged_dir` if needed.
    ///
    /// # Arguments
    /// * `merged_dir` - Directory receiving merged documents (e.g., "merged")
    /// * `url_prefix` - Mount point the directory is served under (e.g., "/merged")
    pub async fn new(merged_dir: impl Into<PathBuf>, url_prefix: String) -> StorageResult<Self> {
        let merged_dir = merged_dir.into();

        fs::create_dir_all(&merged_dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create merged directory {}: {}",
                merged_dir.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            merged_dir,
            url_prefix,
        })
    }

    /// Directory merged documents are written to.
    pub fn merged_dir(&self) -> &Path {
        &self.merged_dir
    }

    /// Map a suggested file name to a path inside the merged directory.
    ///
    /// Names are flat: separators and parent references are rejected so a
    /// name can never resolve outside `merged_dir`.
    fn path_for_name(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "File name is not a plain file name: {name:?}"
            )));
        }

        Ok(self.merged_dir.join(name))
    }
}

#[async_trait]
impl MergeStorage for LocalStorage {
    async fn save_file(&self, local_path: &Path, _original_name: &str) -> StorageResult<String> {
        // Uploads already live on local disk.
        Ok(local_path.to_string_lossy().into_owned())
    }

    async fn save_merged_file(
        &self,
        content: Bytes,
        suggested_name: &str,
    ) -> StorageResult<String> {
        let path = self.path_for_name(suggested_name)?;
        let size = content.len();
        let start = Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&content).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(path.to_string_lossy().into_owned())
    }

    fn file_url(&self, storage_key: &str) -> String {
        let file_name = Path::new(storage_key)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| storage_key.to_string());

        format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name)
    }

    async fn delete_file(&self, storage_key: &str) {
        cleanup::remove_artifact(Path::new(storage_key)).await;
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
