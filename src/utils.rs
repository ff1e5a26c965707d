//! Path helpers shared by the CLI and the engine

use std::path::{Component, Path, PathBuf};

/// Home directory, or the current directory if it cannot be determined
pub fn home_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(input: &str) -> PathBuf {
    expand_home_with(input, &home_dir())
}

fn expand_home_with(input: &str, home: &Path) -> PathBuf {
    if input == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = input.strip_prefix("~/").or_else(|| input.strip_prefix("~\\")) {
        return home.join(rest);
    }
    PathBuf::from(input)
}

/// Resolve user input to an absolute path (after `~` expansion)
///
/// The path does not need to exist.
pub fn resolve_user_path(input: &str) -> PathBuf {
    let expanded = expand_home(input);
    if expanded.is_absolute() {
        return normalize(&expanded);
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    normalize(&cwd.join(expanded))
}

/// Lexically drop `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Form of `path` comparable with paths produced by a scan of a canonical
/// root. The file itself may not exist yet, so only its parent is resolved.
pub fn resolve_for_compare(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Normalize a path for display (strip Windows long-path prefixes).
pub fn display_path(path: &str) -> String {
    #[cfg(windows)]
    {
        if let Some(stripped) = path.strip_prefix(r"\\?\UNC\") {
            return format!(r"\\{}", stripped);
        }
        if let Some(stripped) = path.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }
    path.to_string()
}

/// Show `path` relative to `base` when it lies underneath it
pub fn to_relative_path(path: &str, base: &Path) -> String {
    match Path::new(path).strip_prefix(base) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => display_path(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/kali");

        assert_eq!(expand_home_with("~", home), PathBuf::from("/home/kali"));
        assert_eq!(expand_home_with("~/Documents", home), PathBuf::from("/home/kali/Documents"));
        assert_eq!(expand_home_with("/etc", home), PathBuf::from("/etc"));
        assert_eq!(expand_home_with("~other/x", home), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_resolve_user_path_is_absolute() {
        let resolved = resolve_user_path("some/./relative/../dir");

        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/dir"));
    }

    #[test]
    fn test_resolve_for_compare_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("not_yet.json");

        let resolved = resolve_for_compare(&missing);

        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap().join("not_yet.json"));
    }

    #[test]
    fn test_resolve_for_compare_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("here.json");
        fs::write(&file, "{}").unwrap();

        assert_eq!(resolve_for_compare(&file), file.canonicalize().unwrap());
    }

    #[test]
    fn test_to_relative_path() {
        let base = Path::new("/home/kali");

        assert_eq!(to_relative_path("/home/kali/notes/a.md", base), "notes/a.md");
        assert_eq!(to_relative_path("/home/kali", base), ".");
        assert_eq!(to_relative_path("/etc/hosts", base), "/etc/hosts");
    }
}
