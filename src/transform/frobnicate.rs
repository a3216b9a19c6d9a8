//! Prepend and/or append fixed bytes to every file
//!
//! Useful for a directory of files that are unusable until a magic header or
//! footer is restored.

use crate::discovery::TreeEntry;
use crate::error::{MirrorError, MirrorResult, TransformResult};

use super::{Transform, TransformOutcome};

/// Parse user supplied hex bytes. Case does not matter and whitespace is
/// ignored, so `"FF d8 ff e1"` and `"ffd8ffe1"` are equivalent.
pub fn parse_hex_bytes(input: &str) -> MirrorResult<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|e| MirrorError::InvalidHex {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// Adds a header and/or footer to file contents
#[derive(Debug, Clone)]
pub struct Frobnicator {
    prepend: Vec<u8>,
    append: Vec<u8>,
}

impl Frobnicator {
    /// Fails with [`MirrorError::NoBytesSupplied`] when neither side has bytes
    pub fn new(prepend: Option<Vec<u8>>, append: Option<Vec<u8>>) -> MirrorResult<Self> {
        let prepend = prepend.unwrap_or_default();
        let append = append.unwrap_or_default();
        if prepend.is_empty() && append.is_empty() {
            return Err(MirrorError::NoBytesSupplied);
        }
        Ok(Self { prepend, append })
    }

    /// Build from hex strings as given on the command line
    pub fn from_hex(prepend: Option<&str>, append: Option<&str>) -> MirrorResult<Self> {
        let prepend = prepend.map(parse_hex_bytes).transpose()?;
        let append = append.map(parse_hex_bytes).transpose()?;
        Self::new(prepend, append)
    }

    pub fn frobnicate(&self, contents: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prepend.len() + contents.len() + self.append.len());
        out.extend_from_slice(&self.prepend);
        out.extend_from_slice(contents);
        out.extend_from_slice(&self.append);
        out
    }
}

impl Transform for Frobnicator {
    fn name(&self) -> &'static str {
        "frobnicate"
    }

    fn apply(&mut self, entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        tracing::debug!("Frobnicating '{}'", entry.source.display());
        Ok(TransformOutcome::Write(self.frobnicate(&contents)))
    }
}
