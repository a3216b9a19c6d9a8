use std::path::{Path, PathBuf};

/// Map an input-relative path into the output tree.
/// The relative structure under `output_dir` matches the input exactly.
pub fn map_relative_to_output(relative: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(relative)
}
