//! Testing utilities for curatr
//!
//! Shared fixtures for unit tests: a small EEG-flavoured specification and
//! a helper that materializes a directory tree from relative paths.
//!
//! Only available when compiled with `cfg(test)`.

use std::fs;
use std::path::Path;

use crate::spec::{Specification, TagDef};

/// Specification used across unit tests: one subject level with task-coded
/// recordings below it.
///
/// # Panics
/// Panics if the fixture definitions fail to compile; the patterns are
/// fixed literals so that indicates a broken fixture, not bad input.
#[must_use]
pub fn sample_specification() -> Specification {
    Specification::new(
        "sample",
        vec![
            TagDef::new("subject", r"sub-(\w+)").expect("fixture pattern compiles"),
            TagDef::new("task", r"task-(\w+)").expect("fixture pattern compiles"),
            TagDef::new("suffix", r"_(\w+)\.").expect("fixture pattern compiles"),
            TagDef::new("extension", r"(\.[\w.]+)$").expect("fixture pattern compiles"),
        ],
        vec!["sub-{subject}/sub-{subject}_task-{task}_{suffix}{extension}".to_string()],
    )
    .expect("fixture specification is well-formed")
}

/// Create empty files (and their parent directories) for every relative
/// path under `root`.
///
/// # Panics
/// Panics when a file cannot be created; tests have nothing sensible to do
/// with a broken fixture tree.
pub fn populate_tree(root: &Path, rel_paths: &[&str]) {
    for rel in rel_paths {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("fixture directory is creatable");
        }
        fs::write(&path, b"test content").expect("fixture file is writable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_specification_round_trips() {
        let spec = sample_specification();
        assert!(spec.validate_path("sub-01/sub-01_task-rest_eeg.vhdr"));
        assert!(!spec.validate_path("sub-01/stray.txt"));
    }

    #[test]
    fn test_populate_tree_creates_nested_files() {
        let dir = TempDir::new().unwrap();
        populate_tree(dir.path(), &["a/b/c.txt", "top.txt"]);
        assert!(dir.path().join("a/b/c.txt").exists());
        assert!(dir.path().join("top.txt").exists());
    }
}
