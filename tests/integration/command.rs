//! Integration tests for running whole commands.

use std::path::PathBuf;

use pdfjoin::cli::Command;
use pdfjoin::output::OutputFormatter;
use pdfjoin::{AppConfig, PipelineError, StorageConfig};
use tempfile::TempDir;

use crate::common::*;

fn config(dir: &TempDir) -> AppConfig {
    AppConfig {
        storage: StorageConfig::Local {
            merged_dir: dir.path().join("merged"),
            url_prefix: "/merged".to_string(),
        },
        uploads_dir: dir.path().join("uploads"),
        json: true,
        ..AppConfig::default()
    }
}

fn write_pdf(dir: &TempDir, name: &str, markers: &[i64]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, pdf_with_pages(markers)).unwrap();
    path
}

fn entries(path: PathBuf) -> Vec<PathBuf> {
    std::fs::read_dir(path)
        .map(|dir| dir.map(|entry| entry.unwrap().path()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_merge_command_keeps_originals() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let a = write_pdf(&dir, "a.pdf", &[1]);
    let b = write_pdf(&dir, "b.pdf", &[2, 3]);

    let command = Command::Merge {
        inputs: vec![format!("{}/*.pdf", dir.path().display())],
    };
    pdfjoin::run(command, &config, &OutputFormatter::new(true))
        .await
        .unwrap();

    assert!(a.exists());
    assert!(b.exists());
    assert!(entries(dir.path().join("uploads")).is_empty());

    let merged = entries(dir.path().join("merged"));
    assert_eq!(merged.len(), 1);
    assert_eq!(page_markers(&std::fs::read(&merged[0]).unwrap()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_arrange_then_process_commands() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    write_pdf(&dir, "a.pdf", &[1]);
    write_pdf(&dir, "b.pdf", &[2]);
    let formatter = OutputFormatter::new(true);

    let arrange = Command::Arrange {
        inputs: vec![format!("{}/*.pdf", dir.path().display())],
    };
    pdfjoin::run(arrange, &config, &formatter).await.unwrap();

    let staged = entries(dir.path().join("uploads"));
    assert_eq!(staged.len(), 2);

    let process = Command::Process {
        paths: staged.clone(),
        skipped: vec![],
    };
    pdfjoin::run(process, &config, &formatter).await.unwrap();

    assert!(all_removed(&staged));
    assert_eq!(entries(dir.path().join("merged")).len(), 1);
}

#[tokio::test]
async fn test_process_refuses_files_outside_uploads() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let a = write_pdf(&dir, "a.pdf", &[1]);
    let b = write_pdf(&dir, "b.pdf", &[2]);

    let process = Command::Process {
        paths: vec![a.clone(), b.clone()],
        skipped: vec![],
    };
    let err = pdfjoin::run(process, &config, &OutputFormatter::new(true))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::FilesUnavailable { .. }));
    assert!(a.exists());
    assert!(b.exists());
}

#[tokio::test]
async fn test_merge_command_rejects_oversized_batch() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.policy.max_files = 2;
    for (i, name) in ["a.pdf", "b.pdf", "c.pdf"].iter().enumerate() {
        write_pdf(&dir, name, &[i as i64]);
    }

    let command = Command::Merge {
        inputs: vec![format!("{}/*.pdf", dir.path().display())],
    };
    let err = pdfjoin::run(command, &config, &OutputFormatter::new(true))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TooManyFiles { count: 3, max: 2 }));
    assert!(entries(dir.path().join("uploads")).is_empty());
}
