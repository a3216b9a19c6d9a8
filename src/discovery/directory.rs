use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{filter, relative_to, TreeEntry};

/// Everything found while walking an input tree
#[derive(Debug, Default)]
pub struct Discovery {
    pub entries: Vec<TreeEntry>,
    /// Paths (relative to the root) that could not be listed or inspected
    pub unreadable: Vec<(PathBuf, String)>,
}

impl Discovery {
    pub fn len(&self) -> usize {
        self.entries.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk `root` recursively and collect every mirrorable file.
///
/// Walk errors do not stop the traversal; they are returned alongside the
/// entries so the caller can tally them.
pub fn discover(root: &Path, follow_links: bool) -> Discovery {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root)
        .follow_links(follow_links)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => {
                if entry.depth() > 0 && filter::is_mirrorable(&entry) {
                    discovery
                        .entries
                        .push(TreeEntry::new(root, entry.into_path()));
                }
            }
            Err(e) => {
                let relative = e
                    .path()
                    .map(|p| relative_to(root, p))
                    .unwrap_or_else(|| PathBuf::from("."));
                tracing::warn!("Failed to read '{}': {}", relative.display(), e);
                discovery.unreadable.push((relative, e.to_string()));
            }
        }
    }

    discovery
}
