//! Records of repositories cloned into the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{WorkspaceError, WorkspaceResult};

/// A repository cloned into `repositories/`.
///
/// Written on a successful clone and replaced only on re-clone with overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryWorkspaceEntry {
    /// Destination name relative to `repositories/` (`app` or `app/main`).
    pub name: String,
    /// Absolute checkout location.
    pub local_path: PathBuf,
    /// Clone URL.
    pub cloned_from: String,
    /// Branch checked out, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// When the clone finished.
    pub cloned_at: DateTime<Utc>,
}

impl RepositoryWorkspaceEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        local_path: impl Into<PathBuf>,
        cloned_from: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_path: local_path.into(),
            cloned_from: cloned_from.into(),
            branch: None,
            cloned_at: Utc::now(),
        }
    }

    /// Set the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// On-disk index of [`RepositoryWorkspaceEntry`] records, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIndex {
    #[serde(default)]
    entries: BTreeMap<String, RepositoryWorkspaceEntry>,
}

impl RepositoryIndex {
    /// Load the index, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> WorkspaceResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|source| WorkspaceError::Index {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the index, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> WorkspaceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| WorkspaceError::Index {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), entries = self.entries.len(), "Saved repository index");
        Ok(())
    }

    /// Insert or replace an entry. Returns the entry it replaced.
    pub fn upsert(&mut self, entry: RepositoryWorkspaceEntry) -> Option<RepositoryWorkspaceEntry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    /// Remove an entry by name.
    pub fn remove(&mut self, name: &str) -> Option<RepositoryWorkspaceEntry> {
        self.entries.remove(name)
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RepositoryWorkspaceEntry> {
        self.entries.get(name)
    }

    /// All entries, ordered by name.
    pub fn entries(&self) -> impl Iterator<Item = &RepositoryWorkspaceEntry> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = RepositoryIndex::load(&dir.path().join(".index.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_reclone_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories").join(".index.json");

        let mut index = RepositoryIndex::default();
        index.upsert(RepositoryWorkspaceEntry::new(
            "app",
            "/ws/repositories/app",
            "https://example.com/app.git",
        ));
        index.save(&path).unwrap();

        let mut loaded = RepositoryIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);

        let replaced = loaded.upsert(
            RepositoryWorkspaceEntry::new("app", "/ws/repositories/app", "https://example.com/fork.git")
                .with_branch("dev"),
        );
        assert_eq!(replaced.unwrap().cloned_from, "https://example.com/app.git");
        assert_eq!(loaded.get("app").unwrap().branch.as_deref(), Some("dev"));
    }

    #[test]
    fn test_corrupt_index_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".index.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            RepositoryIndex::load(&path),
            Err(WorkspaceError::Index { .. })
        ));
    }
}
