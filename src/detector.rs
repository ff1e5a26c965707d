//! Diff between the current scan and the previous snapshot
//!
//! Deletions are a plain set difference. "Created" means modified inside the
//! trailing cutoff window, not new since the last run, so a recently touched
//! file is reported on every run until it ages out.

use crate::scanner::FileEntry;
use crate::snapshot::{path_key, PathSet};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Trailing window deciding which files are recent enough to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffWindow(Duration);

impl CutoffWindow {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Windows past chrono's range saturate to the largest representable one.
    pub fn hours(hours: u64) -> Self {
        let duration = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        Self(duration)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Oldest modification time still counted as recent
    ///
    /// Clamped to the earliest representable instant, where every file counts.
    pub fn cutoff_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for CutoffWindow {
    fn default() -> Self {
        Self::hours(24)
    }
}

/// Output of [`detect`], sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub created: Vec<FileEntry>,
    pub deleted: Vec<String>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }
}

/// Compare `current` against `previous`.
///
/// A path missing from `current` is reported deleted whether it was removed
/// or merely failed to stat during this scan.
pub fn detect(current: &[FileEntry], previous: &PathSet, cutoff: DateTime<Utc>) -> Detection {
    let current_paths: HashSet<String> = current.iter().map(|e| path_key(&e.path)).collect();

    // BTreeSet iteration keeps this sorted
    let deleted = previous
        .iter()
        .filter(|path| !current_paths.contains(*path))
        .cloned()
        .collect();

    let mut created: Vec<FileEntry> = current
        .iter()
        .filter(|entry| entry.modified_at >= cutoff)
        .cloned()
        .collect();
    created.sort_by(|a, b| a.path.cmp(&b.path));

    Detection { created, deleted }
}
