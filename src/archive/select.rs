use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files below `root` whose names end in one of `extensions`
///
/// Extensions are given without the leading dot and compared case-sensitively.
/// Directories are walked in file-name order; unreadable ones are skipped.
pub fn select_candidates(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let suffixes: Vec<String> = extensions
        .iter()
        .map(|ext| format!(".{}", ext.trim_start_matches('.')))
        .collect();

    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
        })
        .map(|entry| entry.into_path())
        .collect();

    tracing::debug!("{} candidate files under {}", files.len(), root.display());
    files
}
