//! Configuration options for mirroring a directory tree

use std::path::PathBuf;

use crate::error::{MirrorError, MirrorResult};

/// Default per-file size limit (100MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Mirror run configuration
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root of the tree to read
    pub input_root: PathBuf,
    /// Root of the mirrored tree to write
    pub output_root: PathBuf,
    /// Proceed even if the output root already exists
    pub force: bool,
    /// Follow symbolic links while walking the input tree
    pub follow_symlinks: bool,
    /// Files larger than this are recorded as read failures
    pub max_file_size: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::new(),
            output_root: PathBuf::new(),
            force: false,
            follow_symlinks: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl MirrorConfig {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> MirrorResult<()> {
        if self.input_root.as_os_str().is_empty() {
            return Err(MirrorError::configuration("Input directory must be set"));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(MirrorError::configuration("Output directory must be set"));
        }
        if self.max_file_size == 0 {
            return Err(MirrorError::configuration(
                "Maximum file size must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Parse a size string such as "100MB", "1GB", "500KB" or plain bytes
pub fn parse_size(limit: &str) -> MirrorResult<u64> {
    let limit = limit.trim().to_uppercase();
    let invalid = || MirrorError::configuration(format!("Invalid size: {}", limit));

    let (number, multiplier) = if let Some(n) = limit.strip_suffix("GB") {
        (n, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(n) = limit.strip_suffix("MB") {
        (n, 1024.0 * 1024.0)
    } else if let Some(n) = limit.strip_suffix("KB") {
        (n, 1024.0)
    } else if let Some(n) = limit.strip_suffix('B') {
        return n.trim().parse::<u64>().map_err(|_| invalid());
    } else {
        return limit.parse::<u64>().map_err(|_| invalid());
    };

    let value = number.trim().parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok((value * multiplier) as u64)
}
