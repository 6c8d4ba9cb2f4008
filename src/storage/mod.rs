//! Storage abstraction for uploaded and merged documents.
//!
//! The pipeline only ever talks to [`MergeStorage`]. Two backends exist:
//!
//! - [`LocalStorage`]: merged files land in a directory served under a
//!   static mount point (`/merged/{file}`).
//! - [`ObjectStoreStorage`]: merged files are put under `merged/{file}` in an
//!   S3-compatible bucket and addressed by their public bucket URL.
//!
//! A backend is chosen once at startup with [`create_storage`] and shared
//! read-only (`Arc<dyn MergeStorage>`) across all requests.

pub mod local;
pub mod object;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StorageConfig;

pub use local::LocalStorage;
pub use object::ObjectStoreStorage;

/// Content type recorded for every object written by the storage layer.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Kind of storage backend, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local directory behind a static file mount.
    #[default]
    Local,
    /// S3-compatible object store.
    S3,
}

impl FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" | "remote-object" => Ok(Self::S3),
            other => Err(StorageError::ConfigError(format!(
                "Unknown storage type: {other}. Must be one of: local, s3"
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::S3 => write!(f, "s3"),
        }
    }
}

/// Capability set every storage backend provides to the merge pipeline.
///
/// Implementations hold no per-request state, so one instance can serve any
/// number of concurrent pipelines.
#[async_trait]
pub trait MergeStorage: Send + Sync {
    /// Persist a raw upload and return its storage key.
    async fn save_file(&self, local_path: &Path, original_name: &str) -> StorageResult<String>;

    /// Persist a merged document under `suggested_name` and return its storage key.
    async fn save_merged_file(&self, content: Bytes, suggested_name: &str)
    -> StorageResult<String>;

    /// Resolve a storage key into a URL the caller can hand out.
    fn file_url(&self, storage_key: &str) -> String;

    /// Remove a stored artifact.
    ///
    /// Deletion is best-effort: failures are logged, never returned.
    async fn delete_file(&self, storage_key: &str);

    /// The backend kind, for diagnostics.
    fn backend(&self) -> StorageBackend;
}

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn MergeStorage>> {
    match config {
        StorageConfig::Local {
            merged_dir,
            url_prefix,
        } => {
            let storage = LocalStorage::new(merged_dir, url_prefix.clone()).await?;
            Ok(Arc::new(storage))
        }
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.clone());

            if let Some(endpoint) = endpoint {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

            let storage = ObjectStoreStorage::new(Arc::new(store), bucket.clone(), region.clone())
                .with_endpoint(endpoint.clone());
            Ok(Arc::new(storage))
        }
    }
}
