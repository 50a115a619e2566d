//! Test utilities for creating temporary script directories.
//!
//! This module is only compiled for tests and benchmarks.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory of Python scripts for testing.
///
/// The directory is automatically cleaned up when dropped.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    /// Create a new empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the directory, creating parent dirs as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Create a `<name>/__init__.py` package marker.
    pub fn add_package(&self, name: &str) -> PathBuf {
        self.add_file(&format!("{name}/__init__.py"), "")
    }

    /// Read a file back as a string.
    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.dir.path().join(path)).expect("Failed to read file")
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}
