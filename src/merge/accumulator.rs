//! Merge accumulator built on `lopdf`.
//!
//! Documents are parsed as they are added and combined only when the merged
//! bytes are requested. Each appended document keeps its own page tree; the
//! tree's root is re-parented under the first document's root, so inherited
//! page attributes (media box, resources) survive the merge.

use std::path::PathBuf;

use bytes::Bytes;
use lopdf::{Document, Object, ObjectId};
use tokio::task;

use crate::error::{PipelineError, Result};

/// Content to append to a merge.
#[derive(Debug, Clone)]
pub enum MergeSource {
    /// A PDF on local disk.
    Path(PathBuf),
    /// A PDF already held in memory.
    Bytes(Bytes),
}

impl MergeSource {
    fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} byte buffer>", bytes.len()),
        }
    }

    async fn read(&self) -> Result<Bytes> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await.map(Bytes::from).map_err(|e| {
                PipelineError::merge_failed(format!("Failed to read {}: {}", path.display(), e))
            }),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<PathBuf> for MergeSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Bytes> for MergeSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for MergeSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// Collects documents in order and produces one combined PDF.
///
/// An accumulator serves a single merge. [`MergeAccumulator::save_as_buffer`]
/// consumes it, so state can never carry over into another merge.
#[derive(Debug, Default)]
pub struct MergeAccumulator {
    documents: Vec<Document>,
}

impl MergeAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` and append it after everything added so far.
    ///
    /// # Errors
    ///
    /// Returns `MergeFailed` if the source cannot be read, is not a PDF, or
    /// has no pages.
    pub async fn add(&mut self, source: impl Into<MergeSource>) -> Result<()> {
        let source = source.into();
        let content = source.read().await?;
        let label = source.describe();

        let document = task::spawn_blocking(move || Document::load_mem(&content))
            .await?
            .map_err(|e| PipelineError::merge_failed(format!("Failed to load {label}: {e}")))?;

        if document.get_pages().is_empty() {
            return Err(PipelineError::merge_failed(format!(
                "PDF has no pages: {}",
                source.describe()
            )));
        }

        self.documents.push(document);
        Ok(())
    }

    /// Number of documents added.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document was added yet.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total pages across all added documents.
    pub fn page_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.get_pages().len()).sum()
    }

    /// Combine the added documents, in insertion order, into PDF bytes.
    pub async fn save_as_buffer(self) -> Result<Bytes> {
        let documents = self.documents;

        task::spawn_blocking(move || -> Result<Bytes> {
            let mut merged = merge_documents(documents)?;
            let mut buffer = Vec::new();
            merged
                .save_to(&mut buffer)
                .map_err(|e| PipelineError::merge_failed(format!("Failed to write PDF: {e}")))?;
            Ok(Bytes::from(buffer))
        })
        .await?
    }
}

/// Merge documents into the first one.
fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    let mut documents = documents.into_iter();
    let mut merged = documents
        .next()
        .ok_or_else(|| PipelineError::merge_failed("No documents to merge"))?;

    let root_pages_id = pages_root(&merged)?;
    let mut max_id = merged.max_id;

    for mut doc in documents {
        // Renumber objects to avoid ID conflicts
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let subtree_id = pages_root(&doc)?;
        let page_count = doc.get_pages().len();

        merged.objects.extend(doc.objects);
        attach_page_tree(&mut merged, root_pages_id, subtree_id, page_count)?;
    }

    merged.max_id = max_id;

    // Drop the appended documents' orphaned catalogs.
    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}

/// Object id of the document's root page tree node.
fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(|pages| pages.as_reference())
        .map_err(|e| PipelineError::merge_failed(format!("Failed to get pages reference: {e}")))
}

/// Hang `subtree_id` under `root_id` as its last kid.
fn attach_page_tree(
    merged: &mut Document,
    root_id: ObjectId,
    subtree_id: ObjectId,
    page_count: usize,
) -> Result<()> {
    merged
        .get_dictionary_mut(subtree_id)
        .map_err(|e| PipelineError::merge_failed(format!("Failed to get page subtree: {e}")))?
        .set("Parent", Object::Reference(root_id));

    let root = merged
        .get_dictionary_mut(root_id)
        .map_err(|e| PipelineError::merge_failed(format!("Failed to get pages object: {e}")))?;

    match root.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.push(Object::Reference(subtree_id)),
        Ok(_) => return Err(PipelineError::merge_failed("Kids is not an array")),
        Err(_) => {
            return Err(PipelineError::merge_failed(
                "Pages dictionary missing Kids array",
            ));
        }
    }

    let current_count = root.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
    root.set("Count", Object::Integer(current_count + page_count as i64));

    Ok(())
}
