//! Output formatting and display for pdfjoin.
//!
//! This module handles all user-facing output including:
//! - Merge results with the public URL
//! - Staged batches produced by `arrange`
//! - Skipped-file warnings
//! - Error reports

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use serde::Serialize;

use crate::error::PipelineError;
use crate::pipeline::{ArrangedBatch, PipelineOutput};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReport {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped_files: Vec<String>,
}

/// Display the result of a merge.
pub fn print_merge_output(formatter: &OutputFormatter, output: &PipelineOutput) {
    if formatter.is_json() {
        formatter.json_value(output);
        return;
    }

    formatter.success(&format!("Merged PDF stored at {}", output.url));
    formatter.info(&format!("  Identifier: {}", output.identifier));
    formatter.info(&format!("  Storage key: {}", output.storage_key));
    print_skipped(formatter, &output.skipped_labels());
}

/// Display a staged batch, with a ready-to-run `process` invocation.
pub fn print_arranged(formatter: &OutputFormatter, batch: &ArrangedBatch) {
    if formatter.is_json() {
        formatter.json_value(batch);
        return;
    }

    formatter.success(&format!("{} files ready to merge", batch.files.len()));
    for (index, file) in batch.files.iter().enumerate() {
        formatter.list_item(
            index + 1,
            &format!("{} ({}) -> {}", file.name, file.size, file.path.display()),
        );
    }

    let labels: Vec<String> = batch.skipped.iter().map(|s| s.label()).collect();
    print_skipped(formatter, &labels);
    formatter.info(&format!("\nMerge with:\n  {}", process_command(batch)));
}

/// Report a failed command.
///
/// Only the user-facing message is shown. Skipped files are listed when
/// the error carries them.
pub fn print_error(formatter: &OutputFormatter, err: &PipelineError) {
    let labels: Vec<String> = err.skipped_files().iter().map(|s| s.label()).collect();

    if formatter.is_json() {
        formatter.json_value(&ErrorReport {
            error: err.user_message(),
            skipped_files: labels,
        });
        return;
    }

    formatter.error(&err.user_message());
    for label in &labels {
        formatter.error(&format!("  skipped: {label}"));
    }
}

fn print_skipped(formatter: &OutputFormatter, labels: &[String]) {
    if labels.is_empty() {
        return;
    }
    formatter.warning(&format!("Skipped files: {}", labels.join(", ")));
}

/// The `process` command line that merges `batch` in its current order.
pub fn process_command(batch: &ArrangedBatch) -> String {
    let mut parts = vec!["pdfjoin process".to_string()];
    parts.extend(
        batch
            .files
            .iter()
            .map(|file| shell_quote(&file.path.display().to_string())),
    );
    for skipped in &batch.skipped {
        parts.push(format!(
            "--skipped {}",
            shell_quote(&format!("{}={}", skipped.original_name, skipped.reason))
        ));
    }
    parts.join(" ")
}

fn shell_quote(value: &str) -> String {
    let safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-".contains(c));
    if safe && !value.is_empty() {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
