//! Persisted set of paths seen at the end of the previous run
//!
//! The snapshot is the only durable state. A missing or damaged snapshot
//! reads as an empty set; writes go through a temp file and a rename so a
//! reader never sees a half-written file.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

/// Set of absolute paths, the unit of comparison between runs
pub type PathSet = BTreeSet<String>;

/// String form of a path as stored in the snapshot
///
/// Lossy: bytes that are not valid UTF-8 become U+FFFD, so two such names
/// differing only in those bytes share a key. Work on the file itself
/// (copying) goes through the original `PathBuf`, never the key.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[derive(Serialize, Deserialize, Debug)]
struct SnapshotFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    paths: PathSet,
}

/// What `load` found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    /// No snapshot yet (first run)
    Missing,
    Loaded(usize),
    /// File existed but could not be used; treated as empty
    Corrupt(String),
}

/// Reads and writes the snapshot file for one monitored root
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location for `root`
    pub fn for_root(root: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(default_snapshot_path(root)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temp file used while saving
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Previous path set; empty when there is nothing usable on disk
    pub fn load(&self) -> PathSet {
        self.load_with_status().0
    }

    /// Like [`load`](Self::load), also reporting why the set may be empty
    pub fn load_with_status(&self) -> (PathSet, SnapshotLoad) {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (PathSet::new(), SnapshotLoad::Missing);
            }
            Err(e) => return (PathSet::new(), SnapshotLoad::Corrupt(e.to_string())),
        };

        match serde_json::from_str::<SnapshotFile>(&content) {
            Ok(file) => {
                let count = file.paths.len();
                (file.paths, SnapshotLoad::Loaded(count))
            }
            Err(e) => (PathSet::new(), SnapshotLoad::Corrupt(e.to_string())),
        }
    }

    /// Replace the snapshot with `paths`
    pub fn save(&self, paths: &PathSet, root: Option<&Path>) -> Result<()> {
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            root: root.map(path_key),
            saved_at: Some(Utc::now()),
            paths: paths.clone(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| self.write_error(e.into()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let staging = self.staging_path();
        let written = fs::File::create(&staging).and_then(|mut out| {
            out.write_all(&json)?;
            out.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(self.write_error(e));
        }

        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            self.write_error(e)
        })
    }

    /// Forget everything; the next run starts from an empty set
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.write_error(e)),
        }
    }

    fn write_error(&self, source: std::io::Error) -> TrackerError {
        TrackerError::SnapshotWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Default snapshot location for a root, keyed by a hash of its path
///
/// Location: `<data dir>/kalitracker/snapshots/<hash>.json`
pub fn default_snapshot_path(root: &Path) -> anyhow::Result<PathBuf> {
    let hash = blake3::hash(path_key(root).as_bytes());
    let short = &hash.to_hex()[..16];
    Ok(crate::config::data_dir()?
        .join("snapshots")
        .join(format!("{short}.json")))
}
