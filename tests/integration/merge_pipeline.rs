//! Integration tests for the one-step merge flow.

use pdfjoin::pipeline::run_merge_pipeline;
use pdfjoin::validation::ValidationPolicy;
use tempfile::TempDir;

use crate::common::*;

#[tokio::test]
async fn test_merge_two_pdfs_locally() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1, 2, 3]),
        pdf_upload(dir.path(), "b.pdf", &[4, 5]),
    ];
    let uploads = paths_of(&files);

    let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap();

    assert_eq!(output.url, format!("/merged/{}.pdf", output.identifier));
    assert!(output.skipped_files.is_empty());
    assert!(all_removed(&uploads));

    let merged = std::fs::read(&output.storage_key).unwrap();
    assert_eq!(page_markers(&merged), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_merge_preserves_submission_order() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let files = vec![
        pdf_upload(dir.path(), "third.pdf", &[30]),
        pdf_upload(dir.path(), "first.pdf", &[10]),
        pdf_upload(dir.path(), "second.pdf", &[20, 21]),
    ];

    let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap();

    let merged = std::fs::read(&output.storage_key).unwrap();
    assert_eq!(page_markers(&merged), vec![30, 10, 20, 21]);
}

#[tokio::test]
async fn test_object_store_backend_is_interchangeable() {
    let dir = TempDir::new().unwrap();
    let (store, storage) = memory_storage();
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[7]),
        pdf_upload(dir.path(), "b.pdf", &[8]),
    ];
    let uploads = paths_of(&files);

    let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap();

    assert_eq!(output.storage_key, format!("merged/{}.pdf", output.identifier));
    assert_eq!(
        output.url,
        format!(
            "https://{BUCKET}.s3.{REGION}.amazonaws.com/merged/{}.pdf",
            output.identifier
        )
    );
    assert!(all_removed(&uploads));

    let merged = read_object(&store, &output.storage_key).await;
    assert_eq!(page_markers(&merged), vec![7, 8]);
}

#[tokio::test]
async fn test_identifiers_increase_across_merges() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;

    let mut identifiers = Vec::new();
    for round in 0..3 {
        let files = vec![
            pdf_upload(dir.path(), "a.pdf", &[round]),
            pdf_upload(dir.path(), "b.pdf", &[round + 100]),
        ];
        let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
            .await
            .unwrap();
        identifiers.push(output.identifier);
    }

    assert!(identifiers.windows(2).all(|pair| pair[0] < pair[1]));
    let stored = std::fs::read_dir(dir.path().join("merged")).unwrap().count();
    assert_eq!(stored, 3);
}

#[tokio::test]
async fn test_skipped_files_are_reported_and_removed() {
    let dir = TempDir::new().unwrap();
    let storage = local_storage(&dir).await;
    let text = upload(dir.path(), "x.txt", "text/plain", b"plain text");
    let files = vec![
        pdf_upload(dir.path(), "a.pdf", &[1]),
        text.clone(),
        pdf_upload(dir.path(), "b.pdf", &[2]),
    ];
    let uploads = paths_of(&files);

    let output = run_merge_pipeline(&storage, files, &ValidationPolicy::default())
        .await
        .unwrap();

    assert_eq!(output.skipped_labels(), vec!["x.txt (Not a PDF file)"]);
    assert!(all_removed(&uploads));

    let merged = std::fs::read(&output.storage_key).unwrap();
    assert_eq!(page_markers(&merged), vec![1, 2]);
}
