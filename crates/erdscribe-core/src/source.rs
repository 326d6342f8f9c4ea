//! Candidate source files

use std::path::{Path, PathBuf};

/// One candidate input: a repository-relative path and its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path identifying the file
    pub path: PathBuf,

    /// File contents
    pub text: String,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Path identifying the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Path with forward slashes, independent of platform
    pub fn display_path(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
