use walkdir::DirEntry;

/// Return true for entries the mirror should process: regular files and
/// symlinks that do not resolve to a directory (broken links included, so
/// they surface as read failures).
pub fn is_mirrorable(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
}
