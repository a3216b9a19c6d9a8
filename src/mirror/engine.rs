//! Core engine: walk an input tree and write a transformed mirror of it

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::path_mapping::map_relative_to_output;
use crate::discovery::{discover, TreeEntry};
use crate::error::{EntryFailure, MirrorError, MirrorResult};
use crate::mirror::config::MirrorConfig;
use crate::mirror::stats::MirrorStatistics;
use crate::transform::{Transform, TransformOutcome};

/// Outcome of processing one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Processed { bytes_written: u64 },
    /// The transform declined the file; this is not a failure
    Skipped { reason: String },
    Failed(EntryFailure),
}

/// Tally of a mirror run, keyed by path relative to the input root.
/// Each entry appears in exactly one of the three maps.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorSummary {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub processed: BTreeMap<PathBuf, u64>,
    pub skipped: BTreeMap<PathBuf, String>,
    pub failed: BTreeMap<PathBuf, EntryFailure>,
    pub statistics: MirrorStatistics,
}

impl MirrorSummary {
    pub fn new(input_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            input_root,
            output_root,
            processed: BTreeMap::new(),
            skipped: BTreeMap::new(),
            failed: BTreeMap::new(),
            statistics: MirrorStatistics::new(),
        }
    }

    /// Record the outcome for `relative`, replacing any earlier outcome
    pub fn record(&mut self, relative: PathBuf, outcome: EntryOutcome) {
        self.processed.remove(&relative);
        self.skipped.remove(&relative);
        self.failed.remove(&relative);

        match outcome {
            EntryOutcome::Processed { bytes_written } => {
                self.processed.insert(relative, bytes_written);
            }
            EntryOutcome::Skipped { reason } => {
                self.skipped.insert(relative, reason);
            }
            EntryOutcome::Failed(failure) => {
                self.failed.insert(relative, failure);
            }
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of entries with any recorded outcome
    pub fn total(&self) -> usize {
        self.processed.len() + self.skipped.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Human-readable tally, listing every failed path
    pub fn report(&self) -> String {
        let mut report = String::from("### Files Processed ###\n");
        report.push_str(&format!("{:22} {:10}\n", "Files written:", self.processed_count()));
        report.push_str(&format!("{:22} {:10}\n", "Files skipped:", self.skipped_count()));
        report.push_str(&format!("{:22} {:10}\n", "Files which failed:", self.failed_count()));

        if !self.failed.is_empty() {
            report.push_str("\n### Files which failed to process ###\n");
            for (path, failure) in &self.failed {
                report.push_str(&format!("{} ({})\n", path.display(), failure));
            }
        }
        report
    }

    /// Export to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Mirrors an input tree into an output tree through a [`Transform`]
pub struct MirrorProcessor {
    config: MirrorConfig,
    progress: Option<ProgressBar>,
}

impl MirrorProcessor {
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Tick `progress` once per entry
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Check the input root and prepare the output root.
    ///
    /// Nothing is written when this fails.
    pub fn prepare(&self) -> MirrorResult<()> {
        self.config.validate()?;

        let input = &self.config.input_root;
        if !input.exists() {
            return Err(MirrorError::InputNotFound {
                path: input.clone(),
            });
        }
        if !input.is_dir() {
            return Err(MirrorError::InputNotDirectory {
                path: input.clone(),
            });
        }

        let output = &self.config.output_root;
        if output.exists() {
            if !self.config.force {
                return Err(MirrorError::OutputExists {
                    path: output.clone(),
                });
            }
            if !output.is_dir() {
                return Err(MirrorError::OutputNotDirectory {
                    path: output.clone(),
                });
            }
            info!("'{}' exists, overwriting because force was given", output.display());
        } else {
            fs::create_dir_all(output).map_err(|source| MirrorError::CreateOutput {
                path: output.clone(),
                source,
            })?;
            info!("Created output directory '{}'", output.display());
        }

        Ok(())
    }

    /// Run the whole mirror: setup, traversal and per-file processing.
    ///
    /// Only setup errors are returned; per-file failures end up in the
    /// summary.
    pub fn run<T>(&self, transform: &mut T) -> MirrorResult<MirrorSummary>
    where
        T: Transform + ?Sized,
    {
        self.prepare()?;

        let start = Instant::now();
        let input = &self.config.input_root;
        let output = &self.config.output_root;
        info!(
            "Mirroring '{}' -> '{}' ({})",
            input.display(),
            output.display(),
            transform.name()
        );

        let discovery = discover(input, self.config.follow_symlinks);
        let mut summary = MirrorSummary::new(input.clone(), output.clone());
        summary.statistics.entries_discovered = discovery.len();
        info!("Found {} files", discovery.entries.len());

        for (relative, reason) in discovery.unreadable {
            summary.record(relative, EntryOutcome::Failed(EntryFailure::read(reason)));
        }

        if let Some(pb) = &self.progress {
            pb.set_length(discovery.entries.len() as u64);
        }

        for entry in &discovery.entries {
            let outcome = self.process_entry(entry, transform, &mut summary.statistics);
            log_outcome(&entry.relative, &outcome);
            summary.record(entry.relative.clone(), outcome);

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        transform.finish();
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        summary.statistics.finish(start.elapsed());
        debug!("{}", summary.statistics.summary());
        info!(
            "Done: {} written, {} skipped, {} failed",
            summary.processed_count(),
            summary.skipped_count(),
            summary.failed_count()
        );
        Ok(summary)
    }

    /// Read, transform and write one entry. Never fails the run.
    pub fn process_entry<T>(
        &self,
        entry: &TreeEntry,
        transform: &mut T,
        stats: &mut MirrorStatistics,
    ) -> EntryOutcome
    where
        T: Transform + ?Sized,
    {
        let output = map_relative_to_output(&entry.relative, &self.config.output_root);

        let contents = match read_limited(&entry.source, self.config.max_file_size) {
            Ok(contents) => contents,
            Err(failure) => return EntryOutcome::Failed(failure),
        };
        stats.record_read(contents.len() as u64);

        let bytes = match transform.apply(entry, contents) {
            Ok(TransformOutcome::Write(bytes)) => bytes,
            Ok(TransformOutcome::Skip(reason)) => return EntryOutcome::Skipped { reason },
            Err(e) => return EntryOutcome::Failed(EntryFailure::transform(&e)),
        };

        // Parents are created lazily; create_dir_all tolerates existing ones.
        if let Some(parent) = output.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return EntryOutcome::Failed(EntryFailure::write(format!(
                    "cannot create '{}': {}",
                    parent.display(),
                    e
                )));
            }
        }

        // Not atomic: a failed write may leave a truncated file behind.
        match fs::write(&output, &bytes) {
            Ok(()) => {
                let written = bytes.len() as u64;
                stats.record_written(written);
                EntryOutcome::Processed {
                    bytes_written: written,
                }
            }
            Err(e) => EntryOutcome::Failed(EntryFailure::write(e)),
        }
    }
}

/// Read a whole regular file, refusing files larger than `limit`.
/// FIFOs and devices are refused; the read never takes more than
/// `limit + 1` bytes.
fn read_limited(path: &Path, limit: u64) -> Result<Vec<u8>, EntryFailure> {
    let metadata = fs::metadata(path).map_err(EntryFailure::read)?;
    if !metadata.is_file() {
        return Err(EntryFailure::read("not a regular file"));
    }
    if metadata.len() > limit {
        return Err(too_large(metadata.len(), limit));
    }

    let file = File::open(path).map_err(EntryFailure::read)?;
    let mut contents = Vec::with_capacity(metadata.len() as usize);
    file.take(limit.saturating_add(1))
        .read_to_end(&mut contents)
        .map_err(EntryFailure::read)?;

    if contents.len() as u64 > limit {
        return Err(too_large(contents.len() as u64, limit));
    }
    Ok(contents)
}

fn too_large(size: u64, limit: u64) -> EntryFailure {
    EntryFailure::read(format!(
        "file too large: {} bytes (limit: {} bytes)",
        size, limit
    ))
}

fn log_outcome(relative: &Path, outcome: &EntryOutcome) {
    match outcome {
        EntryOutcome::Processed { bytes_written } => {
            debug!("Wrote '{}' ({} bytes)", relative.display(), bytes_written)
        }
        EntryOutcome::Skipped { reason } => {
            debug!("Skipped '{}': {}", relative.display(), reason)
        }
        EntryOutcome::Failed(failure) => {
            warn!("Failed to process '{}': {}", relative.display(), failure)
        }
    }
}
