//! Directory mirroring
//!
//! This module contains the traversal engine, its configuration, and run
//! statistics.

pub mod config;
pub mod engine;
pub mod stats;

pub use config::{parse_size, MirrorConfig, DEFAULT_MAX_FILE_SIZE};
pub use engine::{EntryOutcome, MirrorProcessor, MirrorSummary};
pub use stats::MirrorStatistics;

use crate::error::MirrorResult;
use crate::transform::Transform;

/// Mirror `config.input_root` into `config.output_root` through `transform`
pub fn mirror_tree<T>(config: MirrorConfig, transform: &mut T) -> MirrorResult<MirrorSummary>
where
    T: Transform + ?Sized,
{
    MirrorProcessor::new(config).run(transform)
}
