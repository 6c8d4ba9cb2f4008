//! Configuration module for pdfjoin.
//!
//! This module transforms CLI arguments (and their environment fallbacks)
//! into a validated, immutable configuration resolved once at startup. It
//! handles:
//! - Storage backend selection and its required settings
//! - The validation policy applied to every batch
//! - Output preferences

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::Settings;
use crate::error::{PipelineError, Result};
use crate::storage::StorageBackend;
use crate::validation::ValidationPolicy;

/// Where merged documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local directory served under a URL prefix.
    Local {
        /// Directory merged files are written to.
        merged_dir: PathBuf,
        /// Mount point of `merged_dir`, e.g. `/merged`.
        url_prefix: String,
    },
    /// S3-compatible bucket.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Bucket region.
        region: String,
        /// Custom endpoint for S3-compatible providers.
        endpoint: Option<String>,
    },
}

impl StorageConfig {
    /// Backend kind this configuration selects.
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Local { .. } => StorageBackend::Local,
            Self::S3 { .. } => StorageBackend::S3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            merged_dir: PathBuf::from("merged"),
            url_prefix: "/merged".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage backend settings.
    pub storage: StorageConfig,

    /// Rules applied to every upload batch.
    pub policy: ValidationPolicy,

    /// Directory uploads are staged in.
    pub uploads_dir: PathBuf,

    /// Print results as JSON.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            policy: ValidationPolicy::default(),
            uploads_dir: PathBuf::from("uploads"),
            json: false,
        }
    }
}

impl TryFrom<&Settings> for AppConfig {
    type Error = PipelineError;

    fn try_from(settings: &Settings) -> Result<Self> {
        let backend: StorageBackend = settings
            .storage
            .parse()
            .map_err(|e: crate::storage::StorageError| PipelineError::invalid_config(e.to_string()))?;

        let storage = match backend {
            StorageBackend::Local => StorageConfig::Local {
                merged_dir: settings.merged_dir.clone(),
                url_prefix: settings.merged_url_prefix.clone(),
            },
            StorageBackend::S3 => StorageConfig::S3 {
                bucket: required(&settings.s3_bucket, "S3_BUCKET")?,
                region: required(&settings.s3_region, "S3_REGION")?,
                endpoint: settings.s3_endpoint.clone().filter(|e| !e.trim().is_empty()),
            },
        };

        if settings.max_file_size_mb == 0 {
            return Err(PipelineError::invalid_config(
                "Maximum file size must be at least 1MB",
            ));
        }

        let policy = ValidationPolicy {
            max_files: settings.max_files,
            ..ValidationPolicy::default()
        }
        .with_max_file_size_mb(settings.max_file_size_mb);

        if policy.max_files < policy.min_valid_files {
            return Err(PipelineError::invalid_config(format!(
                "Maximum file count must be at least {}",
                policy.min_valid_files
            )));
        }

        Ok(Self {
            storage,
            policy,
            uploads_dir: settings.uploads_dir.clone(),
            json: settings.json,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| PipelineError::invalid_config(format!("{name} not configured")))
}
