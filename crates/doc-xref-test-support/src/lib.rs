//! Shared test harness utilities for doc-xref crates.

use std::fs;
use std::path::{Path, PathBuf};

use doc_xref_config::{Config, LoadOptions, CONFIG_FILE_NAME};
use tempfile::TempDir;

/// Temporary project with a `pages/` content root.
pub struct Corpus {
    dir: TempDir,
}

impl Corpus {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("pages")).expect("create content root");
        Corpus { dir }
    }

    /// Project directory (the working directory for config loading).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("pages")
    }

    /// Write a page relative to the content root.
    pub fn page(&self, relative: &str, contents: &str) -> &Self {
        self.write_bytes(&self.root().join(relative), contents.as_bytes());
        self
    }

    /// Write raw bytes relative to the content root.
    pub fn page_bytes(&self, relative: &str, contents: &[u8]) -> &Self {
        self.write_bytes(&self.root().join(relative), contents);
        self
    }

    /// Write `.doc-xref.toml` in the project directory.
    pub fn config_file(&self, contents: &str) -> &Self {
        self.write_bytes(&self.dir.path().join(CONFIG_FILE_NAME), contents.as_bytes());
        self
    }

    /// Load configuration as if run from the project directory.
    pub fn config(&self) -> Config {
        Config::load(LoadOptions::default().with_working_dir(self.dir.path()))
            .expect("load config")
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, contents).expect("write file");
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}
