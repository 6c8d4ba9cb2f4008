//! Integration tests for the two-step arrange/process flow.

use pdfjoin::pipeline::{arrange_uploads, merge_arranged};
use pdfjoin::validation::ValidationPolicy;
use tempfile::TempDir;

use crate::common::*;

#[tokio::test]
async fn test_arrange_then_process_in_new_order() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        pdf_upload(dir.path(), "b.pdf", &[2]),
        upload(dir.path(), "notes.txt", "text/plain", b"notes"),
        pdf_upload(dir.path(), "c.pdf", &[3]),
    ];
    let text_path = files[2].local_path.clone();

    let batch = arrange_uploads(files, &ValidationPolicy::default())
        .await
        .unwrap();
    assert_eq!(batch.files.len(), 3);
    assert!(!text_path.exists());
    assert!(batch.files.iter().all(|f| f.path.exists()));

    let mut order: Vec<_> = batch.files.iter().map(|f| f.path.clone()).collect();
    order.reverse();

    let output = merge_arranged(&storage, order.clone(), batch.skipped.clone())
        .await
        .unwrap();

    assert_eq!(output.skipped_labels(), vec!["notes.txt (Not a PDF file)"]);
    assert!(all_removed(&order));

    let merged = std::fs::read(&output.storage_key).unwrap();
    assert_eq!(page_markers(&merged), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_arrange_rejects_small_batch_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        pdf_upload(dir.path(), "only.pdf", &[1]),
        upload(dir.path(), "image.png", "image/png", b"\x89PNG"),
    ];
    let uploads = paths_of(&files);

    let err = arrange_uploads(files, &ValidationPolicy::default())
        .await
        .unwrap_err();

    assert_eq!(err.skipped_files().len(), 1);
    assert!(all_removed(&uploads));
}

#[tokio::test]
async fn test_process_with_expired_file_cleans_remaining() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        pdf_upload(dir.path(), "b.pdf", &[2]),
    ];
    let mut paths = paths_of(&files);
    paths.push(dir.path().join("expired"));

    let err = merge_arranged(&storage, paths.clone(), vec![])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        pdfjoin::PipelineError::FilesUnavailable { .. }
    ));
    assert!(all_removed(&paths));
    assert_eq!(std::fs::read_dir(dir.path().join("merged")).unwrap().count(), 0);
}
