//! Shared fixtures for loader integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Create a project from `(relative path, contents)` pairs.
///
/// Returns the guard and the canonical project root, so paths compare equal
/// to what the resolver produces on platforms with symlinked temp dirs.
pub fn create_test_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = fs::canonicalize(temp.path()).unwrap();
    for (rel, content) in files {
        write_file(&root, rel, content);
    }
    (temp, root)
}

pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Dependency keys of a file, in insertion order.
pub fn keys(file: &fob_loader::File) -> Vec<&str> {
    file.dependencies.keys().map(String::as_str).collect()
}
