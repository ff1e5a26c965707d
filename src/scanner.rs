//! Directory walk producing the current set of regular files
//!
//! Symlinks are never followed or reported. A file whose metadata cannot be
//! read is dropped from the result and recorded as a [`ScanEntryError`];
//! the walk always runs to completion.

use crate::error::{Result, ScanEntryError, TrackerError};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// A regular file seen by one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
}

/// Everything a scan produced: readable files plus per-entry failures
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Canonical root the scan ran against
    pub root: PathBuf,
    pub entries: Vec<FileEntry>,
    pub errors: Vec<ScanEntryError>,
    seen: HashSet<PathBuf>,
}

impl ScanOutcome {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    /// Record the result of reading one file's modification time.
    ///
    /// Returns false when the entry was dropped, either as a duplicate or
    /// because the read failed.
    pub(crate) fn record(&mut self, path: &Path, modified: std::io::Result<SystemTime>) -> bool {
        match modified {
            Ok(time) => {
                if !self.seen.insert(path.to_path_buf()) {
                    return false;
                }
                self.entries.push(FileEntry {
                    path: path.to_path_buf(),
                    modified_at: time.into(),
                });
                true
            }
            Err(e) => {
                self.errors.push(ScanEntryError::new(path, &e));
                false
            }
        }
    }

    /// Paths of every file in the scan, in snapshot form
    pub fn path_set(&self) -> std::collections::BTreeSet<String> {
        self.entries
            .iter()
            .map(|e| crate::snapshot::path_key(&e.path))
            .collect()
    }
}

/// Walks a root directory and collects regular files with their mtimes
#[derive(Debug, Default)]
pub struct PathScanner {
    exclusions: Option<GlobSet>,
    ignored: Vec<PathBuf>,
}

impl PathScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip paths (relative to the root) matching any of these globs.
    /// Excluded directories are not descended into.
    pub fn with_exclusions(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.exclusions = None;
            return Ok(self);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        self.exclusions = Some(builder.build()?);
        Ok(self)
    }

    /// Never report anything at or below `path` (the snapshot file, the
    /// changelog directory).
    pub fn ignore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    /// Scan `root` recursively.
    ///
    /// Fails only if `root` is not an existing directory.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        if !root.is_dir() {
            return Err(TrackerError::RootNotFound(root.to_path_buf()));
        }
        let root = root
            .canonicalize()
            .map_err(|_| TrackerError::RootNotFound(root.to_path_buf()))?;

        let mut outcome = ScanOutcome::new(root.clone());

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_skipped(&root, entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    outcome.errors.push(ScanEntryError::from_walk(&root, e));
                    continue;
                }
            };

            // file_type() comes from lstat, so symlinks show up as symlinks
            if !entry.file_type().is_file() {
                continue;
            }

            let modified = entry
                .metadata()
                .map_err(std::io::Error::from)
                .and_then(|m| m.modified());
            outcome.record(entry.path(), modified);
        }

        Ok(outcome)
    }

    fn is_skipped(&self, root: &Path, entry: &DirEntry) -> bool {
        // The root itself is never filtered out
        if entry.depth() == 0 {
            return false;
        }
        if entry.path_is_symlink() {
            return true;
        }
        let path = entry.path();
        if self.ignored.iter().any(|ignored| path.starts_with(ignored)) {
            return true;
        }
        match (&self.exclusions, path.strip_prefix(root)) {
            (Some(set), Ok(relative)) => set.is_match(relative),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;

    #[test]
    fn test_scan_finds_nested_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("top.txt"), "1").unwrap();
        fs::write(root.join("a/mid.txt"), "2").unwrap();
        fs::write(root.join("a/b/deep.txt"), "3").unwrap();

        let outcome = PathScanner::new().scan(root).unwrap();

        assert_eq!(outcome.entries.len(), 3);
        assert!(outcome.errors.is_empty());
        assert!(outcome.entries.iter().all(|e| e.path.is_absolute()));
        let names: Vec<_> = outcome
            .entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"deep.txt".to_string()));
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope");

        let result = PathScanner::new().scan(&missing);
        assert!(matches!(result, Err(TrackerError::RootNotFound(p)) if p == missing));
    }

    #[test]
    fn test_scan_root_is_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let result = PathScanner::new().scan(&file);
        assert!(matches!(result, Err(TrackerError::RootNotFound(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_skips_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("root");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(root.join("real.txt"), "x").unwrap();
        fs::write(outside.join("hidden.txt"), "x").unwrap();
        symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        symlink(&outside, root.join("linked_dir")).unwrap();

        let outcome = PathScanner::new().scan(&root).unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].path.ends_with("real.txt"));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_record_failure_keeps_going() {
        let mut outcome = ScanOutcome::new(PathBuf::from("/root"));

        assert!(outcome.record(Path::new("/root/a.txt"), Ok(SystemTime::now())));
        assert!(!outcome.record(
            Path::new("/root/locked.txt"),
            Err(io::Error::from(io::ErrorKind::PermissionDenied)),
        ));
        assert!(outcome.record(Path::new("/root/b.txt"), Ok(SystemTime::now())));

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].path, PathBuf::from("/root/locked.txt"));
    }

    #[test]
    fn test_record_rejects_duplicates() {
        let mut outcome = ScanOutcome::new(PathBuf::from("/root"));
        let now = SystemTime::now();

        assert!(outcome.record(Path::new("/root/a.txt"), Ok(now)));
        assert!(!outcome.record(Path::new("/root/a.txt"), Ok(now)));

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.path_set().len(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "x").unwrap();
        fs::write(root.join("open.txt"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = PathScanner::new().scan(root).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].path.ends_with("open.txt"));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_scan_exclusions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("keep.txt"), "x").unwrap();
        fs::write(root.join("debug.log"), "x").unwrap();

        let scanner = PathScanner::new()
            .with_exclusions(&["node_modules".to_string(), "*.log".to_string()])
            .unwrap();
        let outcome = scanner.scan(root).unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].path.ends_with("keep.txt"));
    }

    #[test]
    fn test_invalid_exclusion() {
        let result = PathScanner::new().with_exclusions(&["a[".to_string()]);
        assert!(matches!(result, Err(TrackerError::Pattern(_))));
    }

    #[test]
    fn test_scan_ignored_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("logs")).unwrap();
        fs::write(root.join("logs/changelog.json"), "{}").unwrap();
        fs::write(root.join("snapshot.json"), "{}").unwrap();
        fs::write(root.join("data.txt"), "x").unwrap();

        let outcome = PathScanner::new()
            .ignore_path(root.join("logs"))
            .ignore_path(root.join("snapshot.json"))
            .scan(&root)
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].path.ends_with("data.txt"));
    }
}
