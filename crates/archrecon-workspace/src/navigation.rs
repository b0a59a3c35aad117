//! Moving around the workspace.
//!
//! All navigation works on a [`WorkspaceContext`] location, never the
//! process working directory. Every move is checked for containment first.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::context::WorkspaceContext;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::layout::REPOSITORIES_DIR;
use crate::normalize::{normalize_from, split_drive};

impl WorkspaceContext {
    /// Names of the entries at the current location, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list_directory(&self) -> WorkspaceResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.current())? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// The current location.
    #[must_use]
    pub fn current_directory(&self) -> PathBuf {
        self.current()
    }

    /// Change the current location.
    ///
    /// Absolute paths are used as given. Paths starting with `./` or `../`
    /// are relative to the current location. Anything else is tried as a
    /// repository name first, then as a relative path.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is outside the workspace, does not
    /// exist, or is not a directory.
    pub fn change_directory(&self, path: &str) -> WorkspaceResult<PathBuf> {
        let trimmed = path.trim();
        let current = self.current();

        let target = if is_absolute_spelling(trimmed) || is_explicitly_relative(trimmed) {
            normalize_from(trimmed, &current)
        } else {
            let repo = self.resolve_repository_path(trimmed);
            if repo.exists() {
                repo
            } else {
                normalize_from(trimmed, &current)
            }
        };

        self.move_to(target)
    }

    /// Move straight to `repositories/<name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is missing, is not a directory, or
    /// the name escapes the workspace.
    pub fn navigate_to_repository(&self, name: &str) -> WorkspaceResult<PathBuf> {
        let target = self.resolve_repository_path(name);
        if !self.contains(&target) {
            return Err(WorkspaceError::OutsideWorkspace { path: target });
        }
        if !target.exists() {
            return Err(WorkspaceError::RepositoryNotFound {
                name: name.to_string(),
                path: target,
            });
        }
        self.move_to(target)
    }

    /// Non-hidden directories under `repositories/`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `repositories/` does not exist or cannot be read.
    pub fn list_repositories(&self) -> WorkspaceResult<Vec<String>> {
        let repositories = self.repositories_root();
        if !repositories.is_dir() {
            return Err(WorkspaceError::NotFound { path: repositories });
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&repositories)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && entry.path().is_dir() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of `repositories/<name>`, or `repositories/` itself for a blank name.
    #[must_use]
    pub fn resolve_repository_path(&self, name: &str) -> PathBuf {
        let repositories = self.repositories_root();
        let name = name.trim();
        if name.is_empty() {
            return repositories;
        }
        normalize_from(name, &repositories)
    }

    fn repositories_root(&self) -> PathBuf {
        normalize_from(REPOSITORIES_DIR, self.root())
    }

    fn move_to(&self, target: PathBuf) -> WorkspaceResult<PathBuf> {
        if !self.contains(&target) {
            return Err(WorkspaceError::OutsideWorkspace { path: target });
        }
        if !target.exists() {
            return Err(WorkspaceError::NotFound { path: target });
        }
        if !target.is_dir() {
            return Err(WorkspaceError::NotADirectory { path: target });
        }

        debug!(to = %target.display(), "Changed location");
        self.set_current(target.clone());
        Ok(target)
    }
}

fn is_absolute_spelling(path: &str) -> bool {
    Path::new(path).is_absolute() || split_drive(path).is_some()
}

fn is_explicitly_relative(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::WorkspaceRoot;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, WorkspaceContext) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("repositories/app/src")).unwrap();
        std::fs::create_dir_all(root.join("repositories/lib")).unwrap();
        std::fs::create_dir_all(root.join("repositories/.cache")).unwrap();
        std::fs::create_dir_all(root.join("notes")).unwrap();
        std::fs::write(root.join("README.md"), "hi").unwrap();
        let ctx = WorkspaceContext::new(WorkspaceRoot::from_normalized(root));
        (dir, ctx)
    }

    #[test]
    fn test_list_directory_sorted() {
        let (_dir, ctx) = workspace();
        assert_eq!(
            ctx.list_directory().unwrap(),
            vec!["README.md", "notes", "repositories"]
        );
    }

    #[test]
    fn test_change_directory_prefers_repository_name() {
        let (_dir, ctx) = workspace();
        let target = ctx.change_directory("app").unwrap();
        assert_eq!(target, ctx.root().join("repositories/app"));
        assert_eq!(ctx.current_directory(), target);
    }

    #[test]
    fn test_change_directory_falls_back_to_relative() {
        let (_dir, ctx) = workspace();
        let target = ctx.change_directory("notes").unwrap();
        assert_eq!(target, ctx.root().join("notes"));
    }

    #[test]
    fn test_change_directory_explicit_relative() {
        let (_dir, ctx) = workspace();
        ctx.change_directory("app").unwrap();
        ctx.change_directory("./src").unwrap();
        assert_eq!(ctx.current(), ctx.root().join("repositories/app/src"));

        ctx.change_directory("../../lib").unwrap();
        assert_eq!(ctx.current(), ctx.root().join("repositories/lib"));
    }

    #[test]
    fn test_change_directory_refuses_escape() {
        let (_dir, ctx) = workspace();
        let before = ctx.current();

        let err = ctx.change_directory("../..").unwrap_err();
        assert!(matches!(err, WorkspaceError::OutsideWorkspace { .. }));
        assert!(err.to_string().contains("outside the allowed workspace"));
        assert_eq!(ctx.current(), before);
    }

    #[test]
    fn test_change_directory_missing_and_file() {
        let (_dir, ctx) = workspace();
        assert!(matches!(
            ctx.change_directory("./nowhere"),
            Err(WorkspaceError::NotFound { .. })
        ));
        assert!(matches!(
            ctx.change_directory("README.md"),
            Err(WorkspaceError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_navigate_to_repository() {
        let (_dir, ctx) = workspace();
        ctx.change_directory("notes").unwrap();

        let target = ctx.navigate_to_repository("lib").unwrap();
        assert_eq!(target, ctx.root().join("repositories/lib"));

        assert!(matches!(
            ctx.navigate_to_repository("ghost"),
            Err(WorkspaceError::RepositoryNotFound { .. })
        ));
        assert!(matches!(
            ctx.navigate_to_repository("../../.."),
            Err(WorkspaceError::OutsideWorkspace { .. })
        ));
    }

    #[test]
    fn test_list_repositories_skips_hidden() {
        let (_dir, ctx) = workspace();
        assert_eq!(ctx.list_repositories().unwrap(), vec!["app", "lib"]);
    }

    #[test]
    fn test_resolve_repository_path_blank() {
        let (_dir, ctx) = workspace();
        assert_eq!(ctx.resolve_repository_path("  "), ctx.root().join("repositories"));
    }
}
