use chrono::{Duration, Utc};
use filetime::FileTime;
use kalitracker::{ChangeKind, PathScanner, SnapshotLoad, SnapshotStore, Tracker};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn set_age(path: &Path, age: Duration) {
    let when = Utc::now() - age;
    filetime::set_file_mtime(path, FileTime::from_unix_time(when.timestamp(), 0)).unwrap();
}

fn names(events: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = events
        .map(|p| Path::new(&p).file_name().unwrap().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn recent_and_deleted_files_across_runs() {
    let workspace = TempDir::new().unwrap();
    let root = workspace.path().join("home");
    fs::create_dir(&root).unwrap();
    let store = SnapshotStore::new(workspace.path().join("snapshot.json"));
    let canonical = root.canonicalize().unwrap();

    // Previous run saw b.txt and c.txt
    let previous = [canonical.join("b.txt"), canonical.join("c.txt")]
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    store.save(&previous, Some(canonical.as_path())).unwrap();

    fs::write(root.join("a.txt"), "new").unwrap();
    fs::write(root.join("b.txt"), "old").unwrap();
    set_age(&root.join("b.txt"), Duration::hours(48));

    let tracker = Tracker::new(PathScanner::new(), store.clone());
    let report = tracker.run(&root).unwrap();

    assert_eq!(names(report.created().map(|e| e.path.clone())), vec!["a.txt"]);
    assert_eq!(names(report.deleted().map(|e| e.path.clone())), vec!["c.txt"]);
    // Created events come first
    assert_eq!(report.events[0].kind, ChangeKind::Created);
    assert_eq!(report.events.last().unwrap().kind, ChangeKind::Deleted);

    // Snapshot now mirrors this run's scan
    let saved = store.load();
    assert_eq!(saved.len(), 2);
    assert!(saved.contains(&canonical.join("a.txt").display().to_string()));
    assert!(!saved.contains(&canonical.join("c.txt").display().to_string()));
}

#[test]
fn unchanged_tree_is_idempotent() {
    let workspace = TempDir::new().unwrap();
    let root = workspace.path().join("tree");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("fresh.txt"), "1").unwrap();
    fs::write(root.join("sub/stale.txt"), "2").unwrap();
    set_age(&root.join("sub/stale.txt"), Duration::days(5));

    let tracker = Tracker::new(
        PathScanner::new(),
        SnapshotStore::new(workspace.path().join("snap.json")),
    );

    let first = tracker.run(&root).unwrap();
    let second = tracker.run(&root).unwrap();
    let much_later = tracker.run_at(&root, Utc::now() + Duration::days(2)).unwrap();

    assert_eq!(first.deleted().count(), 0);
    assert_eq!(second.deleted().count(), 0);
    assert_eq!(first.created().count(), 1);
    assert_eq!(second.created().count(), 1);
    assert_eq!(much_later.created().count(), 0);
    assert_eq!(much_later.deleted().count(), 0);
}

#[test]
fn corrupt_snapshot_reports_no_deletions() {
    let workspace = TempDir::new().unwrap();
    let root = workspace.path().join("tree");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("x.txt"), "x").unwrap();
    let snapshot = workspace.path().join("snap.json");
    fs::write(&snapshot, "{\"paths\": [\"/trunc").unwrap();

    let tracker = Tracker::new(PathScanner::new(), SnapshotStore::new(&snapshot));
    let report = tracker.run(&root).unwrap();

    assert!(matches!(report.previous, SnapshotLoad::Corrupt(_)));
    assert_eq!(report.deleted().count(), 0);
    assert_eq!(names(report.created().map(|e| e.path.clone())), vec!["x.txt"]);
    // The damaged file has been replaced by a valid one
    assert_eq!(SnapshotStore::new(&snapshot).load_with_status().1, SnapshotLoad::Loaded(1));
}

#[test]
fn missing_snapshot_first_run() {
    let workspace = TempDir::new().unwrap();
    fs::write(workspace.path().join("x.txt"), "x").unwrap();
    let store = SnapshotStore::new(workspace.path().join("state").join("snap.json"));

    let report = Tracker::new(PathScanner::new(), store).run(workspace.path()).unwrap();

    assert_eq!(report.previous, SnapshotLoad::Missing);
    assert_eq!(report.deleted().count(), 0);
    assert_eq!(report.created().count(), 1);
    assert!(report.scan_errors.is_empty());
}
