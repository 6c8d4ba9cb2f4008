use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};

use super::{MergeStorage, PDF_CONTENT_TYPE, StorageBackend, StorageError, StorageResult};

/// Object-store backed storage (S3 or any S3-compatible provider).
///
/// The client is built by the caller so tests can hand in an in-memory
/// store. Remote objects are never deleted by this backend.
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl ObjectStoreStorage {
    /// Create a new ObjectStoreStorage around a pre-configured client.
    ///
    /// # Arguments
    /// * `store` - Client already bound to `bucket`
    /// * `bucket` - Bucket name, used for public URLs
    /// * `region` - Bucket region, used for public URLs
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, region: String) -> Self {
        Self {
            store,
            bucket,
            region,
            endpoint_url: None,
        }
    }

    /// Use a custom endpoint (e.g. "http://localhost:9000" for MinIO) for public URLs.
    pub fn with_endpoint(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    fn merged_key(file_name: &str) -> String {
        format!("merged/{file_name}")
    }

    fn upload_key(local_path: &Path) -> String {
        let base = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("uploads/{base}.pdf")
    }

    async fn put(&self, key: &str, content: Bytes, attributes: Attributes) -> StorageResult<()> {
        let size = content.len();
        let location = ObjectPath::from(key);
        let start = Instant::now();

        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&location, PutPayload::from(content), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        Ok(())
    }
}

#[async_trait]
impl MergeStorage for ObjectStoreStorage {
    async fn save_file(&self, local_path: &Path, original_name: &str) -> StorageResult<String> {
        let content = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;

        let key = Self::upload_key(local_path);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, PDF_CONTENT_TYPE.into());
        attributes.insert(
            Attribute::Metadata(Cow::Borrowed("originalname")),
            urlencoding::encode(original_name).into_owned().into(),
        );

        self.put(&key, Bytes::from(content), attributes).await?;
        Ok(key)
    }

    async fn save_merged_file(
        &self,
        content: Bytes,
        suggested_name: &str,
    ) -> StorageResult<String> {
        let key = Self::merged_key(suggested_name);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, PDF_CONTENT_TYPE.into());

        self.put(&key, content, attributes).await?;
        Ok(key)
    }

    /// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
    /// With a custom endpoint, path-style: `{endpoint}/{bucket}/{key}`.
    fn file_url(&self, storage_key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, storage_key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, storage_key
            )
        }
    }

    async fn delete_file(&self, storage_key: &str) {
        // Remote artifacts are retained.
        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            "Object retained, remote deletion is not performed"
        );
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
