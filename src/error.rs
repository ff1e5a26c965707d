use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a tracking run.
///
/// Per-entry scan failures are not here: they are collected as
/// [`ScanEntryError`] values and never abort a run.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Root directory not found or not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to write snapshot {}: {source}", .path.display())]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// A single file or directory the scanner could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntryError {
    pub path: PathBuf,
    pub message: String,
}

impl ScanEntryError {
    pub fn new(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub(crate) fn from_walk(root: &std::path::Path, error: walkdir::Error) -> Self {
        let path = error
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.to_path_buf());
        Self {
            path,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ScanEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
