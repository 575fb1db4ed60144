//! Input expansion
//!
//! Turns a mix of file and directory arguments into a sorted, de-duplicated
//! list of Markdown files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::paths::normalize_lexically;

/// Result of expanding the input paths
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Absolute Markdown file paths, sorted
    pub files: Vec<PathBuf>,
    /// Inputs that did not exist
    pub missing: Vec<PathBuf>,
}

/// File name ends in `.md`, case-insensitive (a bare `.md` counts)
pub fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().to_lowercase().ends_with(".md"))
}

/// Expand `paths` (relative ones against `cwd`), walking directories recursively
pub fn discover_markdown(paths: &[PathBuf], cwd: &Path) -> Discovery {
    let mut files = BTreeSet::new();
    let mut missing = Vec::new();

    for input in paths {
        let path = normalize_lexically(&cwd.join(input));

        if path.is_file() {
            if is_markdown(&path) {
                files.insert(path);
            }
        } else if path.is_dir() {
            files.extend(
                WalkDir::new(&path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
                    .map(|e| e.into_path()),
            );
        } else {
            missing.push(path);
        }
    }

    Discovery {
        files: files.into_iter().collect(),
        missing,
    }
}
