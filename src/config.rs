//! User configuration stored as TOML
//!
//! Location: `~/.config/kalitracker/config.toml` (Linux),
//! `%APPDATA%\kalitracker\config\config.toml` (Windows).

use crate::theme::Theme;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub thresholds: Thresholds,
    pub paths: Paths,
    pub exclusions: Exclusions,
    pub changelog: Changelog,
    pub tracking: Tracking,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Files modified within this many hours count as created
    pub cutoff_hours: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { cutoff_hours: 24 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Paths {
    /// Directory scanned when none is given on the command line
    pub monitor_dir: Option<String>,
    /// Overrides the per-root snapshot location
    pub snapshot_path: Option<String>,
    pub changelog_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Exclusions {
    /// Globs matched against paths relative to the monitored root
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Changelog {
    pub enabled: bool,
}

impl Default for Changelog {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tracking {
    /// Copy newly created files here, mirroring their layout under the root
    pub copy_dir: Option<String>,
}

impl Config {
    /// Load config from disk, falling back to defaults if missing or invalid
    ///
    /// An unreadable or unparsable file is reported on stderr.
    pub fn load() -> Self {
        let Ok(path) = Self::config_path() else {
            return Self::default();
        };
        let (config, problem) = Self::load_or_default(&path);
        if let Some(err) = problem {
            eprintln!("{} {:#}; using defaults", Theme::warning("Warning:"), err);
        }
        config
    }

    /// Defaults when `path` does not exist; defaults plus the error when it
    /// exists but cannot be used
    pub fn load_or_default(path: &std::path::Path) -> (Self, Option<anyhow::Error>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Load config, writing the defaults first if no file exists yet
    pub fn load_or_create() -> Self {
        if let Ok(path) = Self::config_path() {
            if !path.exists() {
                let config = Self::default();
                let _ = config.save();
                return config;
            }
        }
        Self::load()
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Command-line values win over the file
    pub fn apply_cli_overrides(
        &mut self,
        cutoff_hours: Option<u64>,
        snapshot_path: Option<PathBuf>,
        exclude: &[String],
        copy_dir: Option<PathBuf>,
    ) {
        if let Some(hours) = cutoff_hours {
            self.thresholds.cutoff_hours = hours;
        }
        if let Some(path) = snapshot_path {
            self.paths.snapshot_path = Some(path.display().to_string());
        }
        self.exclusions.patterns.extend(exclude.iter().cloned());
        if let Some(dir) = copy_dir {
            self.tracking.copy_dir = Some(dir.display().to_string());
        }
    }

    pub fn cutoff_window(&self) -> crate::detector::CutoffWindow {
        crate::detector::CutoffWindow::hours(self.thresholds.cutoff_hours)
    }

    /// Where changelogs go: the configured directory or `<data dir>/changelog`
    pub fn changelog_dir(&self) -> Result<PathBuf> {
        match &self.paths.changelog_dir {
            Some(dir) => Ok(crate::utils::expand_home(dir)),
            None => Ok(data_dir()?.join("changelog")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "kalitracker").context("Could not determine home directory")
}

/// Per-user data directory holding snapshots and changelogs
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}
