//! treemirror
//!
//! A toolbox of forensic and system-administration utilities. The core walks
//! an input directory tree and writes a mirrored output tree in which every
//! file has been passed through a pluggable transform, tallying which files
//! were processed, skipped and failed.

pub mod cli;
pub mod discovery;
pub mod error;
pub mod mirror;
pub mod tools;
pub mod transform;

// Re-export commonly used types
pub use discovery::TreeEntry;
pub use error::{EntryFailure, FailureStage, MirrorError, MirrorResult, TransformError};
pub use mirror::{mirror_tree, EntryOutcome, MirrorConfig, MirrorProcessor, MirrorSummary};
pub use transform::{
    FixedContent, Frobnicator, Identity, MimeFilter, Transform, TransformOutcome, WechatAudio,
    XmlScrubber,
};
