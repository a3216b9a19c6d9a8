use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treemirror::cli::path_mapping::map_relative_to_output;
use treemirror::discovery::discover;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(&path).unwrap();
    write!(f, "{}", relative).unwrap();
}

#[test]
fn test_discover_nested_tree() {
    let td = TempDir::new().unwrap();
    touch(td.path(), "b.bin");
    touch(td.path(), "a/2.bin");
    touch(td.path(), "a/deep/er/1.bin");
    fs::create_dir_all(td.path().join("empty")).unwrap();

    let found = discover(td.path(), false);
    let relative: Vec<PathBuf> = found.entries.iter().map(|e| e.relative.clone()).collect();

    // Directories are walked but never reported as entries
    assert_eq!(
        relative,
        vec![
            PathBuf::from("a/2.bin"),
            PathBuf::from("a/deep/er/1.bin"),
            PathBuf::from("b.bin"),
        ]
    );
    assert!(found.unreadable.is_empty());
    assert_eq!(found.len(), 3);
}

#[test]
fn test_discover_sources_are_absolute_under_root() {
    let td = TempDir::new().unwrap();
    touch(td.path(), "x/y.txt");

    let found = discover(td.path(), false);
    assert_eq!(found.entries.len(), 1);
    assert_eq!(found.entries[0].source, td.path().join("x/y.txt"));
    assert_eq!(found.entries[0].relative, PathBuf::from("x/y.txt"));
}

#[test]
fn test_discover_empty_directory() {
    let td = TempDir::new().unwrap();
    let found = discover(td.path(), false);
    assert!(found.is_empty());
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_kept_as_entry() {
    let td = TempDir::new().unwrap();
    touch(td.path(), "real.bin");
    std::os::unix::fs::symlink(td.path().join("missing"), td.path().join("dangling.bin")).unwrap();

    let found = discover(td.path(), false);
    let names: Vec<_> = found.entries.iter().map(|e| e.relative.clone()).collect();
    assert_eq!(names, vec![PathBuf::from("dangling.bin"), PathBuf::from("real.bin")]);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_followed_on_request() {
    let td = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    touch(elsewhere.path(), "inner.bin");
    std::os::unix::fs::symlink(elsewhere.path(), td.path().join("linked")).unwrap();

    assert!(discover(td.path(), false).entries.is_empty());

    let followed = discover(td.path(), true);
    assert_eq!(followed.entries.len(), 1);
    assert_eq!(followed.entries[0].relative, PathBuf::from("linked/inner.bin"));
}

#[test]
fn test_output_paths_mirror_input() {
    let output = Path::new("/tmp/clean");

    assert_eq!(
        map_relative_to_output(Path::new("a/b/c.dat"), output),
        PathBuf::from("/tmp/clean/a/b/c.dat")
    );
    assert_eq!(
        map_relative_to_output(Path::new("top.dat"), output),
        PathBuf::from("/tmp/clean/top.dat")
    );
}
