//! Integration tests for rejected batches and failed merges.

use pdfjoin::error::GENERIC_FAILURE_MESSAGE;
use pdfjoin::pipeline::run_merge_pipeline;
use pdfjoin::upload::{PDF_MIME_TYPE, UploadedFile};
use pdfjoin::validation::ValidationPolicy;
use pdfjoin::PipelineError;
use tempfile::TempDir;

use crate::common::*;

#[tokio::test]
async fn test_error_empty_batch() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;

    let err = run_merge_pipeline(&storage, vec![], &ValidationPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoFilesUploaded));
    assert_eq!(err.user_message(), "Please select files to upload.");
}

#[tokio::test]
async fn test_error_single_valid_file() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        upload(dir.path(), "x.txt", "text/plain", b"text"),
    ];
    let uploads = paths_of(&files);

    let err = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap_err();

    match &err {
        PipelineError::InsufficientValidFiles { required, skipped } => {
            assert_eq!(*required, 2);
            assert_eq!(skipped[0].label(), "x.txt (Not a PDF file)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(all_removed(&uploads));
    assert_eq!(std::fs::read_dir(dir.path().join("merged")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_error_oversized_files() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let small = pdf_upload(dir.path(), "small.pdf", &[1]);
    let big_path = dir.path().join("big-upload");
    std::fs::write(&big_path, pdf_with_pages(&[2])).unwrap();
    let big = UploadedFile::new(&big_path, "big.pdf", PDF_MIME_TYPE, 9 * 1024 * 1024);
    let uploads = vec![small.local_path.clone(), big_path.clone()];

    let err = run_merge_pipeline(&storage, vec![small, big], &ValidationPolicy::default())
        .await
        .unwrap_err();

    let labels: Vec<String> = err.skipped_files().iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["big.pdf (Too large: 9.00MB (max 5MB))"]);
    assert!(all_removed(&uploads));
}

#[tokio::test]
async fn test_error_corrupt_pdf_fails_merge() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        upload(dir.path(), "broken.pdf", PDF_MIME_TYPE, b"%PDF-1.4 not really"),
        pdf_upload(dir.path(), "c.pdf", &[3]),
    ];
    let uploads = paths_of(&files);

    let err = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MergeFailed { .. }));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    assert!(all_removed(&uploads));
    assert_eq!(std::fs::read_dir(dir.path().join("merged")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_error_storage_failure_is_generic() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    std::fs::remove_dir(dir.path().join("merged")).unwrap();
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        pdf_upload(dir.path(), "b.pdf", &[2]),
    ];
    let uploads = paths_of(&files);

    let err = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::StorageFailed(_)));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    assert!(all_removed(&uploads));
}

#[tokio::test]
async fn test_error_upload_vanished_before_merge() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        pdf_upload(dir.path(), "b.pdf", &[2]),
    ];
    std::fs::remove_file(&files[1].local_path).unwrap();
    let uploads = paths_of(&files);

    let err = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MergeFailed { .. }));
    assert!(all_removed(&uploads));
}
