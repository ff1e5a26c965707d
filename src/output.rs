use crate::events::{ChangeEvent, ChangeKind};
use crate::history::ChangeLog;
use crate::snapshot::SnapshotLoad;
use crate::theme::Theme;
use crate::tracker::RunReport;
use crate::utils;
use serde::Serialize;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // Every event and every scan error
    VeryVerbose, // Also timestamps
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }

    /// How many events of one kind to list before eliding
    fn event_limit(self) -> usize {
        match self {
            OutputMode::Quiet => 0,
            OutputMode::Normal => 20,
            OutputMode::Verbose | OutputMode::VeryVerbose => usize::MAX,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: String,
    root: String,
    started_at: String,
    cutoff: String,
    files_scanned: usize,
    previous_snapshot: JsonSnapshot,
    snapshot_saved: bool,
    events: &'a [ChangeEvent],
    scan_errors: Vec<JsonScanError>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSnapshot {
    status: &'static str,
    paths: Option<usize>,
    reason: Option<String>,
}

#[derive(Serialize)]
struct JsonScanError {
    path: String,
    error: String,
}

#[derive(Serialize)]
struct JsonSummary {
    created: usize,
    deleted: usize,
    errors: usize,
}

impl From<&SnapshotLoad> for JsonSnapshot {
    fn from(load: &SnapshotLoad) -> Self {
        match load {
            SnapshotLoad::Missing => JsonSnapshot {
                status: "missing",
                paths: None,
                reason: None,
            },
            SnapshotLoad::Loaded(n) => JsonSnapshot {
                status: "loaded",
                paths: Some(*n),
                reason: None,
            },
            SnapshotLoad::Corrupt(reason) => JsonSnapshot {
                status: "corrupt",
                paths: None,
                reason: Some(reason.clone()),
            },
        }
    }
}

pub fn print_json(report: &RunReport) -> anyhow::Result<()> {
    let json = JsonReport {
        version: "1.0".to_string(),
        root: report.root.display().to_string(),
        started_at: report.started_at.to_rfc3339(),
        cutoff: report.cutoff.to_rfc3339(),
        files_scanned: report.files_scanned,
        previous_snapshot: (&report.previous).into(),
        snapshot_saved: report.snapshot_saved,
        events: &report.events,
        scan_errors: report
            .scan_errors
            .iter()
            .map(|e| JsonScanError {
                path: e.path.display().to_string(),
                error: e.message.clone(),
            })
            .collect(),
        summary: JsonSummary {
            created: report.created().count(),
            deleted: report.deleted().count(),
            errors: report.scan_errors.len(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn print_human(report: &RunReport, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("KaliTracker Changes"));
    println!("{}", Theme::divider_bold(60));
    println!(
        "{} {}",
        Theme::muted("Root:"),
        Theme::primary(&utils::display_path(&report.root.to_string_lossy()))
    );
    println!(
        "{} {}",
        Theme::muted("Recent since:"),
        Theme::primary(&report.cutoff.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    );
    match &report.previous {
        SnapshotLoad::Missing => println!(
            "{}",
            Theme::muted("No previous snapshot, deletions start being tracked from this run.")
        ),
        SnapshotLoad::Loaded(n) => println!(
            "{} {}",
            Theme::muted("Previous snapshot:"),
            Theme::primary(&format!("{} paths", n))
        ),
        SnapshotLoad::Corrupt(_) => {}
    }
    println!();

    print_section(report, ChangeKind::Created, mode);
    print_section(report, ChangeKind::Deleted, mode);

    println!("{}", Theme::divider(60));
    if report.events.is_empty() {
        println!("{}", Theme::success("No changes detected."));
    } else {
        println!(
            "{} created, {} deleted ({} files scanned)",
            Theme::created(&report.created().count().to_string()),
            Theme::deleted(&report.deleted().count().to_string()),
            Theme::value(&report.files_scanned.to_string())
        );
    }
    if !report.snapshot_saved {
        println!("{}", Theme::warning("Dry run: snapshot not updated."));
    }
    println!();
}

fn print_section(report: &RunReport, kind: ChangeKind, mode: OutputMode) {
    let events: Vec<&ChangeEvent> = report.events.iter().filter(|e| e.kind == kind).collect();
    if events.is_empty() {
        return;
    }

    let title = match kind {
        ChangeKind::Created => "Created (recently modified)",
        ChangeKind::Deleted => "Deleted",
    };
    println!("{} {}", Theme::header(title), Theme::muted(&format!("({})", events.len())));

    let limit = mode.event_limit();
    for event in events.iter().take(limit) {
        let shown = utils::to_relative_path(&event.path, &report.root);
        let marker = match kind {
            ChangeKind::Created => Theme::created("+"),
            ChangeKind::Deleted => Theme::deleted("-"),
        };
        if mode == OutputMode::VeryVerbose {
            println!(
                "  {} {}  {}",
                marker,
                shown,
                Theme::muted(&event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            );
        } else {
            println!("  {} {}", marker, shown);
        }
    }
    if events.len() > limit {
        println!(
            "  {}",
            Theme::muted(&format!("... and {} more (use -v to list all)", events.len() - limit))
        );
    }
    println!();
}

/// Warnings go to stderr so JSON output stays parseable
pub fn print_warnings(report: &RunReport, mode: OutputMode) {
    for line in warning_lines(report, mode) {
        eprintln!("{}", line);
    }
}

fn warning_lines(report: &RunReport, mode: OutputMode) -> Vec<String> {
    let mut lines = Vec::new();
    if mode == OutputMode::Quiet {
        return lines;
    }

    if let SnapshotLoad::Corrupt(reason) = &report.previous {
        lines.push(format!(
            "{} Snapshot was unreadable and has been treated as empty: {}",
            Theme::warning("Warning:"),
            reason
        ));
    }

    if report.scan_errors.is_empty() {
        return lines;
    }
    lines.push(format!(
        "{} {} entries could not be read and were left out of this run",
        Theme::warning("Warning:"),
        report.scan_errors.len()
    ));
    let limit = if mode == OutputMode::Normal { 5 } else { usize::MAX };
    for error in report.scan_errors.iter().take(limit) {
        lines.push(format!("  {}", Theme::muted(&error.to_string())));
    }
    if report.scan_errors.len() > limit {
        lines.push(format!(
            "  {}",
            Theme::muted(&format!("... and {} more", report.scan_errors.len() - limit))
        ));
    }
    lines
}

pub fn print_changelog(log: &ChangeLog, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!(
        "{} {}",
        Theme::header("Changelog"),
        Theme::muted(&log.run_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    );
    println!("{}", Theme::divider_bold(60));
    println!("{} {}", Theme::muted("Root:"), log.root);
    println!("{} {} hours", Theme::muted("Cutoff:"), log.cutoff_hours);
    println!();
    for event in &log.events {
        let marker = match event.kind {
            ChangeKind::Created => Theme::created("+"),
            ChangeKind::Deleted => Theme::deleted("-"),
        };
        println!(
            "  {} {}  {}",
            marker,
            utils::display_path(&event.path),
            Theme::muted(&event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
        );
    }
    for error in &log.scan_errors {
        println!("  {} {}", Theme::warning("!"), Theme::muted(error));
    }
    println!("{}", Theme::divider(60));
    println!("{}", log.summary());
    println!();
}
