//! Dated changelog records of each run's events
//!
//! Each run that produced at least one event is written to its own
//! `changelog_YYYYMMDD_HHMMSS_mmm.json` file, so past runs can be listed and
//! reviewed later. Existing logs are never overwritten; a clash gets a
//! `_N` suffix.

use crate::events::{ChangeEvent, ChangeKind};
use crate::tracker::RunReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Changelog for a single run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangeLog {
    /// When the run started
    pub run_at: DateTime<Utc>,
    /// Monitored root
    pub root: String,
    pub cutoff_hours: i64,
    pub events: Vec<ChangeEvent>,
    /// Entries the scan could not read, as "path: reason"
    #[serde(default)]
    pub scan_errors: Vec<String>,
}

impl ChangeLog {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            run_at: report.started_at,
            root: report.root.display().to_string(),
            cutoff_hours: (report.started_at - report.cutoff).num_hours(),
            events: report.events.clone(),
            scan_errors: report.scan_errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    fn file_stem(&self) -> String {
        format!("changelog_{}", self.run_at.format("%Y%m%d_%H%M%S_%3f"))
    }

    /// File name for this run
    pub fn file_name(&self) -> String {
        format!("{}.json", self.file_stem())
    }

    /// Save the log into `dir`, creating it if needed
    ///
    /// Returns the path to the saved log file
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create changelog directory: {}", dir.display()))?;

        let json = serde_json::to_string_pretty(self).context("Failed to serialize changelog")?;

        let mut log_path = dir.join(self.file_name());
        let mut suffix = 0;
        let mut file = loop {
            match OpenOptions::new().write(true).create_new(true).open(&log_path) {
                Ok(file) => break file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    suffix += 1;
                    log_path = dir.join(format!("{}_{}.json", self.file_stem(), suffix));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create changelog {}", log_path.display())
                    })
                }
            }
        };

        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write changelog to {}", log_path.display()))?;

        Ok(log_path)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} deleted, {} scan errors",
            self.count(ChangeKind::Created),
            self.count(ChangeKind::Deleted),
            self.scan_errors.len()
        )
    }
}

/// List all changelog files in `dir`, newest first
pub fn list_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read changelog directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy().to_string());
            matches!(name, Some(n) if n.starts_with("changelog_") && n.ends_with(".json"))
        })
        .collect();

    // Timestamped names sort chronologically
    logs.sort();
    logs.reverse();

    Ok(logs)
}

/// Load a changelog from a file
pub fn load_log(path: &Path) -> Result<ChangeLog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read changelog: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse changelog: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn log_at(secs: i64) -> ChangeLog {
        let run_at = Utc.timestamp_opt(secs, 0).unwrap();
        ChangeLog {
            run_at,
            root: "/home/kali".to_string(),
            cutoff_hours: 24,
            events: vec![
                ChangeEvent {
                    kind: ChangeKind::Created,
                    path: "/home/kali/new.txt".to_string(),
                    timestamp: run_at,
                },
                ChangeEvent {
                    kind: ChangeKind::Deleted,
                    path: "/home/kali/old.txt".to_string(),
                    timestamp: run_at,
                },
            ],
            scan_errors: vec!["/home/kali/locked: Permission denied".to_string()],
        }
    }

    #[test]
    fn test_file_name() {
        // 2024-01-02 03:04:05 UTC
        let mut log = log_at(1_704_164_645);
        assert_eq!(log.file_name(), "changelog_20240102_030405_000.json");

        log.run_at = Utc.timestamp_opt(1_704_164_645, 250_000_000).unwrap();
        assert_eq!(log.file_name(), "changelog_20240102_030405_250.json");
    }

    #[test]
    fn test_same_instant_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let first = log_at(1_704_164_645);
        let mut second = log_at(1_704_164_645);
        second.events.truncate(1);

        let first_path = first.save(dir).unwrap();
        let second_path = second.save(dir).unwrap();

        assert_ne!(first_path, second_path);
        assert!(second_path.ends_with("changelog_20240102_030405_000_1.json"));
        assert_eq!(load_log(&first_path).unwrap().events.len(), 2);
        assert_eq!(load_log(&second_path).unwrap().events.len(), 1);

        // The later save lists first
        let logs = list_logs(dir).unwrap();
        assert_eq!(logs, vec![second_path, first_path]);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let log = log_at(1_704_164_645);

        let path = log.save(&temp_dir.path().join("logs")).unwrap();
        let loaded = load_log(&path).unwrap();

        assert_eq!(loaded.events, log.events);
        assert_eq!(loaded.root, "/home/kali");
        assert_eq!(loaded.scan_errors.len(), 1);
    }

    #[test]
    fn test_list_logs_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        log_at(1_704_164_645).save(dir).unwrap();
        log_at(1_704_251_045).save(dir).unwrap();
        fs::write(dir.join("notes.json"), "{}").unwrap();

        let logs = list_logs(dir).unwrap();

        assert_eq!(logs.len(), 2);
        assert!(logs[0].ends_with("changelog_20240103_030405_000.json"));
    }

    #[test]
    fn test_list_logs_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_logs(&temp_dir.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn test_load_invalid_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("changelog_bad.json");
        fs::write(&path, "not json").unwrap();

        assert!(load_log(&path).is_err());
    }

    #[test]
    fn test_summary() {
        assert_eq!(log_at(0).summary(), "1 created, 1 deleted, 1 scan errors");
    }
}
