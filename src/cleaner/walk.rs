use crate::imaging::has_supported_extension;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Candidate images under a raw root, in processing order
#[derive(Debug, Default)]
pub struct Candidates {
    /// Allow-listed files, sorted by path
    pub files: Vec<PathBuf>,
    /// Regular files with other extensions
    pub ignored: usize,
    /// Entries that could not be read
    pub walk_errors: usize,
}

/// Recursively collect allow-listed image files under `root`.
///
/// Siblings are visited in file-name order and the result is sorted by
/// path, so "first seen" is reproducible across runs and platforms.
pub fn collect_candidates(root: &Path) -> Candidates {
    let mut candidates = Candidates::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                if has_supported_extension(entry.path()) {
                    candidates.files.push(entry.into_path());
                } else {
                    tracing::debug!("Ignoring non-image file: {}", entry.path().display());
                    candidates.ignored += 1;
                }
            }
            Err(error) => {
                tracing::warn!("Skipping unreadable entry: {}", error);
                candidates.walk_errors += 1;
            }
        }
    }

    candidates.files.sort();
    candidates
}
