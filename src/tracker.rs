//! One tracking run: scan, load the previous snapshot, diff, emit, save
//!
//! Steps run strictly in that order. The snapshot is saved last so a run
//! that fails part way never advances it past an incomplete scan. Callers
//! with their own follow-up work (changelogs, copies) use [`Tracker::prepare`]
//! and [`Tracker::commit`] to slot it in before the save.

use crate::detector::{self, CutoffWindow};
use crate::error::{Result, ScanEntryError};
use crate::events::{self, ChangeEvent, ChangeKind};
use crate::scanner::PathScanner;
use crate::snapshot::{PathSet, SnapshotLoad, SnapshotStore};
use crate::utils;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Canonical root that was scanned
    pub root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub files_scanned: usize,
    pub previous: SnapshotLoad,
    pub events: Vec<ChangeEvent>,
    /// On-disk paths behind the Created events, in the same order
    pub created_paths: Vec<PathBuf>,
    pub scan_errors: Vec<ScanEntryError>,
    /// False for dry runs and runs not yet committed
    pub snapshot_saved: bool,
}

/// A scanned and diffed run whose snapshot has not been saved yet
#[derive(Debug)]
pub struct PendingRun {
    report: RunReport,
    current: PathSet,
}

impl PendingRun {
    pub fn report(&self) -> &RunReport {
        &self.report
    }
}

impl RunReport {
    pub fn created(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(|e| e.kind == ChangeKind::Created)
    }

    pub fn deleted(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(|e| e.kind == ChangeKind::Deleted)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files scanned, {} created, {} deleted, {} errors",
            self.files_scanned,
            self.created().count(),
            self.deleted().count(),
            self.scan_errors.len()
        )
    }
}

/// Runs the change-detection engine against one snapshot store
pub struct Tracker {
    scanner: PathScanner,
    store: SnapshotStore,
    window: CutoffWindow,
    persist: bool,
}

impl Tracker {
    /// The store's own files are never reported, even inside the root.
    pub fn new(scanner: PathScanner, store: SnapshotStore) -> Self {
        let scanner = scanner
            .ignore_path(utils::resolve_for_compare(store.path()))
            .ignore_path(utils::resolve_for_compare(&store.staging_path()));
        Self {
            scanner,
            store,
            window: CutoffWindow::default(),
            persist: true,
        }
    }

    pub fn with_window(mut self, window: CutoffWindow) -> Self {
        self.window = window;
        self
    }

    /// Compute events without touching the snapshot
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.persist = !dry_run;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn run(&self, root: &Path) -> Result<RunReport> {
        self.run_at(root, Utc::now())
    }

    /// Run with an explicit notion of "now"
    pub fn run_at(&self, root: &Path, now: DateTime<Utc>) -> Result<RunReport> {
        let pending = self.prepare_at(root, now)?;
        self.commit(pending)
    }

    pub fn prepare(&self, root: &Path) -> Result<PendingRun> {
        self.prepare_at(root, Utc::now())
    }

    /// Scan, load and diff without saving anything
    pub fn prepare_at(&self, root: &Path, now: DateTime<Utc>) -> Result<PendingRun> {
        let outcome = self.scanner.scan(root)?;
        let (previous, previous_status) = self.store.load_with_status();

        let cutoff = self.window.cutoff_from(now);
        let detection = detector::detect(&outcome.entries, &previous, cutoff);
        let events = events::emit(&detection, now);

        let current = outcome.path_set();
        Ok(PendingRun {
            report: RunReport {
                files_scanned: outcome.entries.len(),
                root: outcome.root,
                started_at: now,
                cutoff,
                previous: previous_status,
                events,
                created_paths: detection.created.into_iter().map(|e| e.path).collect(),
                scan_errors: outcome.errors,
                snapshot_saved: false,
            },
            current,
        })
    }

    /// Save the pending run's scan as the new snapshot; a no-op for dry runs
    pub fn commit(&self, pending: PendingRun) -> Result<RunReport> {
        let PendingRun { mut report, current } = pending;
        if self.persist {
            self.store.save(&current, Some(report.root.as_path()))?;
            report.snapshot_saved = true;
        }
        Ok(report)
    }
}
