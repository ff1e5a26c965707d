use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::history::{self, ChangeLog};
use crate::output::{self, OutputMode};
use crate::progress;
use crate::scanner::PathScanner;
use crate::snapshot::{SnapshotLoad, SnapshotStore};
use crate::theme::Theme;
use crate::tracked::{self, CopyResult};
use crate::tracker::{PendingRun, RunReport, Tracker};
use crate::utils;

#[derive(Parser)]
#[command(name = "kalitracker")]
#[command(version)]
#[command(about = "Track files created or deleted in a directory between runs")]
#[command(long_about = "KaliTracker compares a directory against the snapshot taken on its \
    previous run and reports deleted files plus files modified within a recent window.\n\n\
    Examples:\n  \
    kalitracker scan                     # Scan the home directory\n  \
    kalitracker scan ~/projects --json   # Scan a directory, JSON output\n  \
    kalitracker scan --cutoff-hours 72   # Treat the last 3 days as recent\n  \
    kalitracker history --last           # Show the latest changelog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory and report changes since the last run
    #[command(visible_alias = "s")]
    Scan {
        /// Directory to monitor (default: config monitor_dir, then home)
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Files modified within this many hours count as created [default: 24]
        #[arg(long, value_name = "HOURS")]
        cutoff_hours: Option<u64>,

        /// Snapshot file to compare against and update
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Exclude paths matching glob, relative to the root (repeatable)
        #[arg(long, value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Report changes without updating the snapshot or writing a changelog
        #[arg(long)]
        dry_run: bool,

        /// Do not write a changelog file for this run
        #[arg(long)]
        no_log: bool,

        /// Copy created files into this directory
        #[arg(long, value_name = "DIR")]
        copy_to: Option<PathBuf>,
    },

    /// Inspect or reset the stored snapshot for a directory
    Snapshot {
        /// Monitored directory (default: config monitor_dir, then home)
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Snapshot file to use instead of the default for PATH
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Delete the snapshot; the next scan reports no deletions
        #[arg(long)]
        clear: bool,
    },

    /// List changelogs written by previous runs
    #[command(visible_alias = "h")]
    History {
        /// Print the most recent changelog
        #[arg(long)]
        last: bool,

        /// Print a specific changelog file
        #[arg(long, value_name = "FILE", conflicts_with = "last")]
        show: Option<PathBuf>,

        /// Maximum number of changelogs to list
        #[arg(long, default_value = "20", value_name = "N")]
        limit: usize,
    },

    /// View or modify configuration
    Config {
        /// Show current configuration (the default)
        #[arg(long, conflicts_with_all = ["reset", "path"])]
        show: bool,

        /// Reset to defaults
        #[arg(long, conflicts_with = "path")]
        reset: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> anyhow::Result<()> {
        let output_mode = OutputMode::from_flags(self.quiet, self.verbose);

        match self.command {
            Commands::Scan { path, cutoff_hours, snapshot, exclude, json, dry_run, no_log, copy_to } => {
                let mut config = Config::load();
                config.apply_cli_overrides(cutoff_hours, snapshot, &exclude, copy_to);
                run_scan(&config, path.as_deref(), json, dry_run, no_log, output_mode)
            }
            Commands::Snapshot { path, snapshot, clear } => {
                let mut config = Config::load();
                config.apply_cli_overrides(None, snapshot, &[], None);
                let root = monitor_root(&config, path.as_deref());
                let store = snapshot_store(&config, &root)?;

                if clear {
                    if store.clear()? {
                        println!("{} Removed {}", Theme::success("OK"), store.path().display());
                    } else if output_mode != OutputMode::Quiet {
                        println!("{}", Theme::muted("No snapshot to remove."));
                    }
                    return Ok(());
                }

                let (paths, status) = store.load_with_status();
                println!("{} {}", Theme::muted("Root:"), root.display());
                println!("{} {}", Theme::muted("Snapshot:"), store.path().display());
                match status {
                    SnapshotLoad::Missing => println!("{}", Theme::muted("No snapshot yet.")),
                    SnapshotLoad::Loaded(n) => println!("{} {} paths", Theme::muted("Contains:"), Theme::value(&n.to_string())),
                    SnapshotLoad::Corrupt(reason) => println!("{} {}", Theme::warning("Unreadable:"), reason),
                }
                if output_mode == OutputMode::Verbose || output_mode == OutputMode::VeryVerbose {
                    for path in &paths {
                        println!("  {}", utils::to_relative_path(path, &root));
                    }
                }
                Ok(())
            }
            Commands::History { last, show, limit } => {
                let config = Config::load();
                let dir = config.changelog_dir()?;

                if let Some(file) = show {
                    let log = history::load_log(&file)?;
                    output::print_changelog(&log, output_mode);
                    return Ok(());
                }

                let logs = history::list_logs(&dir)?;
                if logs.is_empty() {
                    println!("{}", Theme::muted(&format!("No changelogs in {}", dir.display())));
                    return Ok(());
                }

                if last {
                    let log = history::load_log(&logs[0])?;
                    output::print_changelog(&log, output_mode);
                    return Ok(());
                }

                println!("{}", Theme::header("Changelogs"));
                println!("{}", Theme::divider_bold(60));
                for path in logs.iter().take(limit) {
                    let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                    match history::load_log(path) {
                        Ok(log) => println!("  {}  {}", Theme::command(&name), Theme::muted(&log.summary())),
                        Err(_) => println!("  {}  {}", Theme::command(&name), Theme::warning("unreadable")),
                    }
                }
                if logs.len() > limit {
                    println!("  {}", Theme::muted(&format!("... and {} older", logs.len() - limit)));
                }
                println!();
                println!("{} {}", Theme::muted("Directory:"), dir.display());
                Ok(())
            }
            Commands::Config { show, reset, path } => {
                if show || !(reset || path) {
                    print_config(&Config::load_or_create());
                } else if reset {
                    let saved = Config::default().save()?;
                    println!("{} Configuration reset to defaults ({}).", Theme::success("OK"), saved.display());
                } else {
                    println!("{}", Config::config_path()?.display());
                }
                Ok(())
            }
        }
    }
}

fn run_scan(
    config: &Config,
    path: Option<&str>,
    json: bool,
    dry_run: bool,
    no_log: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let root = monitor_root(config, path);
    let store = snapshot_store(config, &root)?;
    let steps = FinishSteps::new(config, dry_run, no_log)?;

    let mut scanner = PathScanner::new().with_exclusions(&config.exclusions.patterns)?;
    scanner = scanner.ignore_path(utils::resolve_for_compare(&config.changelog_dir()?));
    if let Some(dir) = &steps.copy_dir {
        scanner = scanner.ignore_path(utils::resolve_for_compare(dir));
    }

    let tracker = Tracker::new(scanner, store)
        .with_window(config.cutoff_window())
        .dry_run(dry_run);

    let spinner = if output_mode != OutputMode::Quiet && !json {
        Some(progress::create_spinner(&format!("Scanning {}...", root.display())))
    } else {
        None
    };
    let result = tracker.prepare(&root);
    if let Some(sp) = spinner {
        progress::finish_and_clear(&sp);
    }
    let pending = result.with_context(|| format!("Scan of {} failed", root.display()))?;

    let finished = finish_scan(&tracker, pending, &steps)?;
    let report = &finished.report;

    if json {
        output::print_json(report)?;
    } else {
        output::print_human(report, output_mode);
    }
    output::print_warnings(report, output_mode);

    let chatty = output_mode != OutputMode::Quiet && !json;
    if let (Some(log_path), true) = (&finished.changelog, chatty) {
        println!("{} {}", Theme::muted("Changelog written to"), log_path.display());
    }
    if let Some((dest, copied)) = &finished.copies {
        if chatty && !copied.copied.is_empty() {
            println!(
                "{} {} files to {}",
                Theme::muted("Copied"),
                Theme::value(&copied.copied.len().to_string()),
                dest.display()
            );
        }
        if output_mode != OutputMode::Quiet {
            for failure in &copied.failed {
                eprintln!("{} Copy failed for {}", Theme::warning("Warning:"), failure);
            }
        }
    }

    Ok(())
}

/// Work done between the diff and the snapshot save
struct FinishSteps {
    dry_run: bool,
    /// None when changelogs are off for this run
    changelog_dir: Option<PathBuf>,
    copy_dir: Option<PathBuf>,
}

impl FinishSteps {
    fn new(config: &Config, dry_run: bool, no_log: bool) -> anyhow::Result<Self> {
        let changelog_dir = if config.changelog.enabled && !no_log {
            Some(config.changelog_dir()?)
        } else {
            None
        };
        Ok(Self {
            dry_run,
            changelog_dir,
            copy_dir: config.tracking.copy_dir.as_deref().map(utils::resolve_user_path),
        })
    }
}

struct FinishedScan {
    report: RunReport,
    changelog: Option<PathBuf>,
    copies: Option<(PathBuf, CopyResult)>,
}

/// Write the changelog and copies, then save the snapshot.
///
/// A changelog failure aborts before the save, so the next run reports the
/// same deletions again. Copy failures are only recorded.
fn finish_scan(tracker: &Tracker, pending: PendingRun, steps: &FinishSteps) -> anyhow::Result<FinishedScan> {
    let report = pending.report();
    let mut changelog = None;
    let mut copies = None;

    if !steps.dry_run {
        if let Some(dir) = &steps.changelog_dir {
            if !report.events.is_empty() {
                let log_path = ChangeLog::from_report(report)
                    .save(dir)
                    .context("Changelog not written, snapshot left unchanged")?;
                changelog = Some(log_path);
            }
        }
        if let Some(dest) = &steps.copy_dir {
            let copied = tracked::copy_created(&report.created_paths, &report.root, dest);
            copies = Some((dest.clone(), copied));
        }
    }

    let report = tracker.commit(pending)?;
    Ok(FinishedScan { report, changelog, copies })
}

/// Directory to scan: explicit argument, then config, then home
fn monitor_root(config: &Config, path: Option<&str>) -> PathBuf {
    match path.or(config.paths.monitor_dir.as_deref()) {
        Some(input) => utils::resolve_user_path(input),
        None => utils::home_dir(),
    }
}

fn snapshot_store(config: &Config, root: &Path) -> anyhow::Result<SnapshotStore> {
    match &config.paths.snapshot_path {
        Some(path) => Ok(SnapshotStore::new(utils::resolve_user_path(path))),
        None => {
            let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            SnapshotStore::for_root(&canonical)
        }
    }
}

fn print_config(config: &Config) {
    println!("{}", Theme::header("Current Configuration"));
    println!("{}", Theme::divider_bold(60));
    println!();
    println!("Thresholds:");
    println!("  Cutoff window: {} hours", config.thresholds.cutoff_hours);
    println!();
    println!("Paths:");
    match &config.paths.monitor_dir {
        Some(dir) => println!("  Monitor dir: {}", dir),
        None => println!("  Monitor dir: (home directory)"),
    }
    match &config.paths.snapshot_path {
        Some(path) => println!("  Snapshot: {}", path),
        None => println!("  Snapshot: (per-directory default)"),
    }
    match config.changelog_dir() {
        Ok(dir) => println!("  Changelog dir: {}", dir.display()),
        Err(_) => println!("  Changelog dir: (unavailable)"),
    }
    println!();
    println!("Exclusions:");
    if config.exclusions.patterns.is_empty() {
        println!("  (none)");
    } else {
        for pattern in &config.exclusions.patterns {
            println!("  {}", pattern);
        }
    }
    println!();
    println!("Changelog:");
    println!("  Enabled: {}", config.changelog.enabled);
    println!();
    println!("Tracking:");
    match &config.tracking.copy_dir {
        Some(dir) => println!("  Copy created files to: {}", dir),
        None => println!("  Copy created files: off"),
    }
    println!();
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}
