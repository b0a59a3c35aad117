//! Path normalization across native, WSL and Git-Bash drive spellings.
//!
//! The same Windows location can reach us as `C:\repo`, `/mnt/c/repo` or
//! `/c/repo`. All three collapse to the native drive form before resolution,
//! so containment checks compare like with like.
//!
//! Resolution follows a non-strict policy by default: symlinks are resolved
//! for the longest prefix that exists, and the remainder is cleaned lexically.
//! The `*_strict` variants instead fail when any component is missing.
//!
//! On non-Windows hosts a drive-form path cannot be queried on disk. It is
//! rendered as `X:/rest`, cleaned lexically, and treated as already absolute.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use crate::error::{WorkspaceError, WorkspaceResult};

/// Normalize `raw` against the process working directory.
///
/// Only meant for startup, when the workspace root itself is resolved.
/// Everything after that resolves against a [`crate::WorkspaceContext`].
#[must_use]
pub fn normalize(raw: &str) -> PathBuf {
    normalize_from(raw, &process_base())
}

/// Normalize `raw`, resolving relative input against `base`. Never fails.
#[must_use]
pub fn normalize_from(raw: &str, base: &Path) -> PathBuf {
    let rewritten = rewrite_drive_spelling(raw.trim());
    if let Some(path) = foreign_drive_path(&rewritten) {
        return path;
    }
    resolve_existing_prefix(&absolutize(&rewritten, base))
}

/// Strictly normalize `raw` against the process working directory.
///
/// # Errors
///
/// Returns [`WorkspaceError::PathResolution`] if any component does not exist.
pub fn normalize_strict(raw: &str) -> WorkspaceResult<PathBuf> {
    normalize_strict_from(raw, &process_base())
}

/// Strictly normalize `raw`, resolving relative input against `base`.
///
/// # Errors
///
/// Returns [`WorkspaceError::PathResolution`] if any component does not exist.
/// Drive-form paths on a non-Windows host can never be resolved strictly.
pub fn normalize_strict_from(raw: &str, base: &Path) -> WorkspaceResult<PathBuf> {
    let rewritten = rewrite_drive_spelling(raw.trim());
    if let Some(path) = foreign_drive_path(&rewritten) {
        return Err(WorkspaceError::PathResolution { path });
    }
    let absolute = absolutize(&rewritten, base);
    absolute
        .canonicalize()
        .map_err(|_| WorkspaceError::PathResolution { path: absolute })
}

/// Rewrite WSL (`/mnt/c/...`) and Git-Bash (`/c/...`) spellings into `C:/...`.
///
/// Any other input is returned untouched.
#[must_use]
pub fn rewrite_drive_spelling(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();

    if raw.starts_with("/mnt/")
        && bytes.len() > 6
        && bytes[5].is_ascii_alphabetic()
        && bytes[6] == b'/'
    {
        let drive = char::from(bytes[5].to_ascii_uppercase());
        return Cow::Owned(format!("{drive}:/{}", &raw[7..]));
    }

    if bytes.len() > 2 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b'/' {
        let drive = char::from(bytes[1].to_ascii_uppercase());
        return Cow::Owned(format!("{drive}:/{}", &raw[3..]));
    }

    Cow::Borrowed(raw)
}

/// Split a native drive-form path (`C:\x`, `c:/x`, `C:`) into letter and rest.
#[must_use]
pub fn split_drive(path: &str) -> Option<(char, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return None;
    }
    match bytes.get(2) {
        None => Some((char::from(bytes[0].to_ascii_uppercase()), "")),
        Some(b'/' | b'\\') => Some((char::from(bytes[0].to_ascii_uppercase()), &path[3..])),
        Some(_) => None,
    }
}

#[cfg(not(windows))]
fn foreign_drive_path(path: &str) -> Option<PathBuf> {
    let (drive, rest) = split_drive(path)?;
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(['/', '\\']) {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            name => segments.push(name),
        }
    }
    Some(PathBuf::from(format!("{drive}:/{}", segments.join("/"))))
}

#[cfg(windows)]
fn foreign_drive_path(_path: &str) -> Option<PathBuf> {
    None
}

fn process_base() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
}

fn absolutize(raw: &str, base: &Path) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Canonicalize the longest existing prefix, then append the rest lexically.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = path.components().collect();
    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = prefix.canonicalize() {
            resolved.extend(&components[split..]);
            return lexical_clean(&resolved);
        }
    }
    lexical_clean(path)
}

/// Drop `.` segments and fold `..` into its parent, never above the root.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if matches!(cleaned.components().next_back(), Some(Component::Normal(_))) {
                    cleaned.pop();
                }
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rewrite_wsl_mount() {
        assert_eq!(rewrite_drive_spelling("/mnt/c/Users/dev"), "C:/Users/dev");
        assert_eq!(rewrite_drive_spelling("/mnt/d/"), "D:/");
    }

    #[test]
    fn test_rewrite_git_bash() {
        assert_eq!(rewrite_drive_spelling("/c/Users/dev"), "C:/Users/dev");
    }

    #[test]
    fn test_rewrite_leaves_other_paths() {
        assert_eq!(rewrite_drive_spelling("/mnt/c"), "/mnt/c");
        assert_eq!(rewrite_drive_spelling("/mnt/cd/x"), "/mnt/cd/x");
        assert_eq!(rewrite_drive_spelling("/home/dev"), "/home/dev");
        assert_eq!(rewrite_drive_spelling("relative/path"), "relative/path");
    }

    #[test]
    fn test_split_drive() {
        assert_eq!(split_drive("C:\\Users"), Some(('C', "Users")));
        assert_eq!(split_drive("d:/work"), Some(('D', "work")));
        assert_eq!(split_drive("E:"), Some(('E', "")));
        assert_eq!(split_drive("C:Users"), None);
        assert_eq!(split_drive("/tmp"), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_three_spellings_agree() {
        let base = Path::new("/");
        let native = normalize_from("C:\\Users\\dev\\repo", base);
        let wsl = normalize_from("/mnt/c/Users/dev/repo", base);
        let git_bash = normalize_from("  /c/Users/dev/repo  ", base);

        assert_eq!(native, PathBuf::from("C:/Users/dev/repo"));
        assert_eq!(native, wsl);
        assert_eq!(native, git_bash);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_drive_dot_segments_stay_on_drive() {
        let base = Path::new("/");
        assert_eq!(
            normalize_from("C:\\a\\.\\b\\..\\..\\..\\c", base),
            PathBuf::from("C:/c")
        );
    }

    #[test]
    fn test_relative_resolves_against_base() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();
        std::fs::create_dir(base.join("sub")).unwrap();

        assert_eq!(normalize_from("sub", &base), base.join("sub"));
        assert_eq!(normalize_from("./sub/../sub/.", &base), base.join("sub"));
    }

    #[test]
    fn test_nonexistent_tail_is_lexical() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();

        assert_eq!(
            normalize_from("missing/deeper/../leaf", &base),
            base.join("missing").join("leaf")
        );
    }

    #[test]
    fn test_parent_never_climbs_above_root() {
        assert_eq!(lexical_clean(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_resolved() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();
        std::fs::create_dir(base.join("real")).unwrap();
        std::os::unix::fs::symlink(base.join("real"), base.join("link")).unwrap();

        assert_eq!(normalize_from("link/file.txt", &base), base.join("real").join("file.txt"));
    }

    #[test]
    fn test_strict_fails_on_missing_component() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();

        let result = normalize_strict_from("nope/child", &base);
        assert!(matches!(result, Err(WorkspaceError::PathResolution { .. })));

        std::fs::create_dir(base.join("yes")).unwrap();
        assert_eq!(normalize_strict_from("yes", &base).unwrap(), base.join("yes"));
    }
}
