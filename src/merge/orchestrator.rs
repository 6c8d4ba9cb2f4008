//! Merge, persist, resolve.
//!
//! [`merge_files`] turns an ordered list of sources into a stored document:
//! it merges into a buffer, names the buffer after a fresh identifier, hands
//! it to the storage backend and resolves the public URL. Nothing reaches
//! storage unless the complete buffer was produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::accumulator::{MergeAccumulator, MergeSource};
use crate::error::{PipelineError, Result};
use crate::storage::MergeStorage;

/// Fewest sources a merge accepts.
pub const MIN_MERGE_SOURCES: usize = 2;

/// A merged document that has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    /// Millisecond-based unique identifier.
    pub identifier: u64,

    /// Key the backend stored the document under.
    pub storage_key: String,

    /// URL resolving to the stored document.
    pub public_url: String,
}

/// Millisecond timestamps that never repeat within one process.
///
/// Each call returns `max(now_ms, previous + 1)`, so two merges finishing in
/// the same millisecond still get distinct file names.
#[derive(Debug, Default)]
pub struct IdentifierGenerator {
    last: AtomicU64,
}

impl IdentifierGenerator {
    /// Create a generator with no history.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Next identifier; strictly greater than any previously returned.
    pub fn generate(&self) -> u64 {
        let now = epoch_millis();
        let mut last = self.last.load(Ordering::Relaxed);

        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

static IDENTIFIERS: IdentifierGenerator = IdentifierGenerator::new();

/// Next process-wide merge identifier.
pub fn next_identifier() -> u64 {
    IDENTIFIERS.generate()
}

/// File name a merged document is stored under.
pub fn merged_file_name(identifier: u64) -> String {
    format!("{identifier}.pdf")
}

/// Merge `sources` in order and persist the result through `storage`.
///
/// # Errors
///
/// - `InsufficientValidFiles` if fewer than [`MIN_MERGE_SOURCES`] sources are given
/// - `MergeFailed` if any source cannot be read or parsed
/// - `StorageFailed` if the backend rejects the merged document
pub async fn merge_files(storage: &dyn MergeStorage, sources: Vec<MergeSource>) -> Result<MergeResult> {
    if sources.len() < MIN_MERGE_SOURCES {
        return Err(PipelineError::insufficient_valid_files(
            MIN_MERGE_SOURCES,
            Vec::new(),
        ));
    }

    let start = Instant::now();
    let source_count = sources.len();

    let mut accumulator = MergeAccumulator::new();
    for source in sources {
        accumulator.add(source).await?;
    }
    let page_count = accumulator.page_count();
    let buffer = accumulator.save_as_buffer().await?;
    let size = buffer.len();

    let identifier = next_identifier();
    let file_name = merged_file_name(identifier);

    let storage_key = storage.save_merged_file(buffer, &file_name).await?;
    let public_url = storage.file_url(&storage_key);

    tracing::info!(
        identifier,
        backend = %storage.backend(),
        key = %storage_key,
        files = source_count,
        pages = page_count,
        size_bytes = size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Merged PDF stored"
    );

    Ok(MergeResult {
        identifier,
        storage_key,
        public_url,
    })
}
