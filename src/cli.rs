//! CLI argument parsing for pdfjoin.
//!
//! Every setting can also come from the environment (or a `.env` file), so
//! a deployment configures storage once and invocations only name files.
//!
//! ```text
//! pdfjoin merge a.pdf b.pdf notes.txt
//! pdfjoin arrange 'scans/*.pdf' --json
//! pdfjoin process uploads/3f.. uploads/9c.. --skipped "notes.txt=Not a PDF file"
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::validation::SkippedFile;

/// Validate uploaded PDF batches, merge them and store the result.
#[derive(Parser, Debug)]
#[command(name = "pdfjoin")]
#[command(version)]
#[command(about = "Merge uploaded PDF files into one stored document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub settings: Settings,
}

/// What to do with the given files.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate, merge and store a batch in one step
    ///
    /// Files are merged in the order provided. Glob patterns are expanded.
    Merge {
        /// Input files (or glob patterns)
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Validate a batch and stage the valid files for a later `process`
    Arrange {
        /// Input files (or glob patterns)
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Merge previously staged files in the given order
    Process {
        /// Staged paths as printed by `arrange`, in merge order
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Skipped file to report, as NAME=REASON
        #[arg(long = "skipped", value_name = "NAME=REASON", value_parser = parse_skipped)]
        skipped: Vec<SkippedFile>,
    },
}

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Storage backend for merged files: local or s3
    #[arg(long, global = true, env = "PDFJOIN_STORAGE", default_value = "local")]
    pub storage: String,

    /// Directory merged files are written to (local storage)
    #[arg(long, global = true, env = "MERGED_DIR", default_value = "merged")]
    pub merged_dir: PathBuf,

    /// URL path the merged directory is served under (local storage)
    #[arg(long, global = true, env = "MERGED_URL_PREFIX", default_value = "/merged")]
    pub merged_url_prefix: String,

    /// Directory uploads are staged in
    #[arg(long, global = true, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Bucket name (s3 storage)
    #[arg(long, global = true, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Bucket region (s3 storage)
    #[arg(long, global = true, env = "S3_REGION")]
    pub s3_region: Option<String>,

    /// Custom endpoint for S3-compatible providers
    #[arg(long, global = true, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Largest accepted file in megabytes
    #[arg(long, global = true, env = "MAX_FILE_SIZE_MB", default_value_t = 5)]
    pub max_file_size_mb: u64,

    /// Most files accepted per batch
    #[arg(long, global = true, env = "MAX_FILES", default_value_t = 10)]
    pub max_files: usize,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

fn parse_skipped(value: &str) -> Result<SkippedFile, String> {
    let (name, reason) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=REASON, got {value:?}"))?;

    if name.trim().is_empty() {
        return Err("skipped file name is empty".to_string());
    }

    Ok(SkippedFile {
        original_name: name.trim().to_string(),
        reason: reason.trim().to_string(),
    })
}
