//! Discovery of the files that make up an input tree

pub mod directory;
pub mod filter;

use std::path::{Path, PathBuf};

pub use directory::{discover, Discovery};

/// A file found under the input root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the input root
    pub relative: PathBuf,
    /// Full path of the source file
    pub source: PathBuf,
}

impl TreeEntry {
    pub fn new(root: &Path, source: PathBuf) -> Self {
        let relative = relative_to(root, &source);
        Self { relative, source }
    }
}

/// Path of `path` relative to `root`, or `.` for the root itself
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}
