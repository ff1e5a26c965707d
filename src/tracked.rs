//! Copy newly created files into a tracking folder
//!
//! Files keep their layout relative to the monitored root, so
//! `<root>/notes/a.md` lands at `<dest>/notes/a.md`.

use crate::error::ScanEntryError;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one copy pass
#[derive(Debug, Default)]
pub struct CopyResult {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<ScanEntryError>,
}

/// Copy each created file under `root` into `dest`.
///
/// Takes the on-disk paths (`RunReport::created_paths`) rather than event
/// strings, so names that are not valid UTF-8 still copy. A failed copy is
/// recorded and the rest continue. Files that already live inside `dest` are
/// skipped.
pub fn copy_created(files: &[PathBuf], root: &Path, dest: &Path) -> CopyResult {
    let mut result = CopyResult::default();

    for source in files {
        let source = source.as_path();
        if source.starts_with(dest) {
            continue;
        }
        let relative = match source.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => match source.file_name() {
                Some(name) => Path::new(name),
                None => continue,
            },
        };
        let target = dest.join(relative);

        let copied = target
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::copy(source, &target));

        match copied {
            Ok(_) => result.copied.push(target),
            Err(e) => result.failed.push(ScanEntryError::new(source, &e)),
        }
    }

    result
}
