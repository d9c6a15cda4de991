//! Temporary directory trees for discovery tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::discovery::CONFIG_FILENAME;

/// A temporary directory tree that config files are written into.
pub struct TestDir {
    /// Owned temporary root.
    root: TempDir,
}

impl TestDir {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates `rel_path` and its parents; `""` is the root itself.
    pub fn dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Writes a `.concord.toml` holding `content` inside `rel_path`.
    pub fn config(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.dir(rel_path).join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    /// Writes a `.concord.toml` that only sets the context width.
    pub fn window_config(&self, rel_path: &str, tokens: usize) -> PathBuf {
        let content = format!("[window]\ntokens_before = {tokens}\ntokens_after = {tokens}\n");
        self.config(rel_path, &content)
    }

    /// Writes a `.concord.toml` that stops the upward search.
    pub fn root_config(&self, rel_path: &str) -> PathBuf {
        self.config(rel_path, "root = true\n")
    }
}
