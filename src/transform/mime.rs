//! Classify files by MIME type and copy only those not excluded

use std::collections::{BTreeMap, BTreeSet};

use crate::discovery::TreeEntry;
use crate::error::TransformResult;

use super::{Transform, TransformOutcome};

/// Label for files whose type could not be confirmed
pub const UNCONFIRMED_SIGNATURE: &str = "unknown";

/// Label for empty files
pub const EMPTY_SIGNATURE: &str = "inode/x-empty";

pub const TEXT_SIGNATURE: &str = "text/plain";

pub const BINARY_SIGNATURE: &str = "application/octet-stream";

/// MIME types excluded when none are given
pub const DEFAULT_EXCLUDE_MIME: [&str; 2] = [BINARY_SIGNATURE, UNCONFIRMED_SIGNATURE];

/// Derive a MIME label from file content
pub fn classify(contents: &[u8]) -> String {
    if contents.is_empty() {
        return EMPTY_SIGNATURE.to_string();
    }

    if let Some(kind) = infer::get(contents) {
        return kind.mime_type().to_string();
    }

    if looks_like_text(contents) {
        TEXT_SIGNATURE.to_string()
    } else {
        BINARY_SIGNATURE.to_string()
    }
}

fn looks_like_text(contents: &[u8]) -> bool {
    !contents.contains(&0) && std::str::from_utf8(contents).is_ok()
}

/// Copies files whose MIME label is not in the exclusion set
#[derive(Debug, Clone)]
pub struct MimeFilter {
    exclude: BTreeSet<String>,
    breakdown: BTreeMap<String, usize>,
    excluded: usize,
    list: bool,
}

impl Default for MimeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDE_MIME.iter().map(|m| m.to_string()))
    }
}

impl MimeFilter {
    pub fn new<I>(exclude: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            exclude: exclude.into_iter().map(|m| m.to_lowercase()).collect(),
            breakdown: BTreeMap::new(),
            excluded: 0,
            list: false,
        }
    }

    /// Log every file and its label as it is classified
    pub fn with_listing(mut self, list: bool) -> Self {
        self.list = list;
        self
    }

    pub fn is_excluded(&self, label: &str) -> bool {
        self.exclude.contains(&label.to_lowercase())
    }

    /// Count of files seen per MIME label
    pub fn breakdown(&self) -> &BTreeMap<String, usize> {
        &self.breakdown
    }

    pub fn total(&self) -> usize {
        self.breakdown.values().sum()
    }

    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Render the MIME statistics table
    pub fn statistics_report(&self) -> String {
        let mut report = String::from("### MIME Statistics ###\n");
        report.push_str(&format!("{:35} {:10}\n", "Total files found", self.total()));
        report.push_str(&format!("{:35} {:10}\n", "Total files excluded", self.excluded));
        report.push_str("\n### MIME Breakdown ###\n");
        for (label, count) in &self.breakdown {
            report.push_str(&format!("{:35} {:10}\n", label, count));
        }
        report
    }
}

impl Transform for MimeFilter {
    fn name(&self) -> &'static str {
        "mime"
    }

    fn apply(&mut self, entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        let label = classify(&contents);
        if self.list {
            tracing::info!("{} {}", entry.relative.display(), label);
        }
        *self.breakdown.entry(label.clone()).or_insert(0) += 1;

        if self.is_excluded(&label) {
            self.excluded += 1;
            return Ok(TransformOutcome::skip(format!("excluded MIME type {}", label)));
        }

        tracing::debug!("Copying '{}' ({})", entry.source.display(), label);
        Ok(TransformOutcome::Write(contents))
    }
}
