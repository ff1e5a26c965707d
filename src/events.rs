//! Change records handed to the changelog writer and the CLI

use crate::detector::Detection;
use crate::snapshot::path_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// One path's status change between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: String,
    /// Modification time for created files, detection time for deleted ones
    pub timestamp: DateTime<Utc>,
}

/// Turn a detection into events: all Created first, then all Deleted.
pub fn emit(detection: &Detection, detected_at: DateTime<Utc>) -> Vec<ChangeEvent> {
    let created = detection.created.iter().map(|entry| ChangeEvent {
        kind: ChangeKind::Created,
        path: path_key(&entry.path),
        timestamp: entry.modified_at,
    });
    let deleted = detection.deleted.iter().map(|path| ChangeEvent {
        kind: ChangeKind::Deleted,
        path: path.clone(),
        timestamp: detected_at,
    });
    created.chain(deleted).collect()
}
