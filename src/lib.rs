//! KaliTracker library crate
//!
//! Point-in-time change detection for a directory tree: scan the tree,
//! compare it with the snapshot from the previous run, and report deleted
//! files plus files modified within a trailing window. Exposed both as a CLI
//! binary and as a library API.

pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod history;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod snapshot;
pub mod theme;
pub mod tracked;
pub mod tracker;
pub mod utils;

pub use detector::{detect, CutoffWindow, Detection};
pub use error::{ScanEntryError, TrackerError};
pub use events::{emit, ChangeEvent, ChangeKind};
pub use scanner::{FileEntry, PathScanner, ScanOutcome};
pub use snapshot::{PathSet, SnapshotLoad, SnapshotStore};
pub use tracker::{PendingRun, RunReport, Tracker};
