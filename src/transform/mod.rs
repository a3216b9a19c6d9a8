//! Per-file transforms plugged into the mirror engine
//!
//! Every strategy implements [`Transform`]: it receives the full contents of
//! one file and either returns the bytes to write, declines the file with a
//! [`TransformOutcome::Skip`], or fails with a [`TransformError`].

pub mod frobnicate;
pub mod mime;
pub mod redact;
pub mod wechat;
pub mod xml_scrub;

pub use frobnicate::Frobnicator;
pub use mime::MimeFilter;
pub use redact::FixedContent;
pub use wechat::WechatAudio;
pub use xml_scrub::XmlScrubber;

use crate::discovery::TreeEntry;
use crate::error::{TransformError, TransformResult};

/// What to do with one file after transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// Write these bytes to the mirrored output path
    Write(Vec<u8>),
    /// The file does not apply to this transform; nothing is written
    Skip(String),
}

impl TransformOutcome {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip(reason.into())
    }
}

/// A per-file transformation strategy
pub trait Transform {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Transform the contents of `entry`
    fn apply(&mut self, entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome>;

    /// Called once after every entry has been visited
    fn finish(&mut self) {}
}

/// Copies every file unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Transform for Identity {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn apply(&mut self, _entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        Ok(TransformOutcome::Write(contents))
    }
}

impl<F> Transform for F
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, TransformError>,
{
    fn name(&self) -> &'static str {
        "custom"
    }

    fn apply(&mut self, _entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        self(&contents).map(TransformOutcome::Write)
    }
}
