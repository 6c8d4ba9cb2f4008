//! Input path helpers.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Expand every pattern into the files it names, keeping pattern order.
///
/// Plain paths pass through unchanged. Matches of one glob pattern are
/// returned in the order `glob` yields them (alphabetical). Directories
/// matched by a pattern are ignored.
///
/// # Errors
///
/// - `FilesUnavailable` if a pattern matches no file
/// - `InvalidConfig` if a pattern is not a valid glob
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        resolved_paths.extend(collect_paths_for_pattern(pattern.as_ref())?);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|err| {
        PipelineError::invalid_config(format!("Invalid pattern {pattern:?}: {err}"))
    })?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| PipelineError::files_unavailable(err.path()))?;
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    if resolved_paths.is_empty() {
        return Err(PipelineError::files_unavailable(pattern));
    }

    Ok(resolved_paths)
}
