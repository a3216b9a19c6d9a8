//! Overwrite every file with the same clean content
//!
//! Typical use is replacing a directory of pictures with a single sanitized
//! picture while keeping the original file names.

use std::path::Path;

use crate::discovery::TreeEntry;
use crate::error::{MirrorError, MirrorResult, TransformResult};

use super::{Transform, TransformOutcome};

#[derive(Debug, Clone)]
pub struct FixedContent {
    content: Vec<u8>,
}

impl FixedContent {
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Load the replacement content from a file
    pub fn from_file(path: &Path) -> MirrorResult<Self> {
        let content = std::fs::read(path).map_err(|e| MirrorError::io(path, e))?;
        Ok(Self::new(content))
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl Transform for FixedContent {
    fn name(&self) -> &'static str {
        "redact"
    }

    fn apply(&mut self, entry: &TreeEntry, _contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        tracing::debug!("Redacting '{}'", entry.relative.display());
        Ok(TransformOutcome::Write(self.content.clone()))
    }
}
