//! Directory scaffolding under the workspace root.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── repositories/                 (cloned repositories, one dir each)
//! │   └── .index.json               (RepositoryWorkspaceEntry records)
//! ├── temp/
//! │   └── repositories/             (extraction artifacts)
//! ├── logs/                         (rolling log files)
//! └── diagrams/                     (saved .puml files, configurable)
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::WorkspaceResult;

/// Directory holding cloned repositories.
pub const REPOSITORIES_DIR: &str = "repositories";
/// Directory holding extraction artifacts.
pub const TEMP_REPOSITORIES_DIR: &str = "temp/repositories";
/// Directory holding log files.
pub const LOGS_DIR: &str = "logs";
/// Default directory for saved diagrams.
pub const DEFAULT_DIAGRAMS_DIR: &str = "diagrams";
/// Repository index file name, inside [`REPOSITORIES_DIR`].
pub const INDEX_FILE: &str = ".index.json";

/// Named directories under a workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    diagrams: PathBuf,
}

impl WorkspaceLayout {
    /// Create the layout for `root` with the default diagrams directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let diagrams = root.join(DEFAULT_DIAGRAMS_DIR);
        Self { root, diagrams }
    }

    /// Set the diagrams directory. Relative paths are taken from the root.
    #[must_use]
    pub fn with_diagrams_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.diagrams = self.root.join(dir);
        self
    }

    /// Get the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/repositories/`
    #[must_use]
    pub fn repositories_dir(&self) -> PathBuf {
        self.root.join(REPOSITORIES_DIR)
    }

    /// `<root>/temp/repositories/`
    #[must_use]
    pub fn temp_repositories_dir(&self) -> PathBuf {
        self.root.join(TEMP_REPOSITORIES_DIR)
    }

    /// `<root>/logs/`
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// The diagrams directory.
    #[must_use]
    pub fn diagrams_dir(&self) -> &Path {
        &self.diagrams
    }

    /// `<root>/repositories/.index.json`
    #[must_use]
    pub fn index_file(&self) -> PathBuf {
        self.repositories_dir().join(INDEX_FILE)
    }

    /// Directories [`WorkspaceLayout::setup`] creates under the root.
    #[must_use]
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.repositories_dir(),
            self.temp_repositories_dir(),
            self.logs_dir(),
            self.diagrams.clone(),
        ]
    }

    /// Create the root and every required directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn setup(&self) -> WorkspaceResult<SetupReport> {
        let base_workspace = make_directory(&self.root)?;

        let mut report = SetupReport {
            base_workspace,
            created: Vec::new(),
            existing: Vec::new(),
        };
        for dir in self.required_dirs() {
            let status = make_directory(&dir)?;
            match status.status {
                DirState::Created => report.created.push(status.path),
                DirState::Exists => report.existing.push(status.path),
            }
        }

        info!(
            root = %self.root.display(),
            created = report.created.len(),
            existing = report.existing.len(),
            "Workspace layout ready"
        );
        Ok(report)
    }
}

/// Whether [`make_directory`] had to create the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirState {
    /// Newly created.
    Created,
    /// Already present.
    Exists,
}

/// Outcome of creating one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStatus {
    /// Created or already present.
    pub status: DirState,
    /// The directory.
    pub path: PathBuf,
    /// Human-readable summary.
    pub message: String,
}

/// Outcome of [`WorkspaceLayout::setup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReport {
    /// Status of the root itself.
    pub base_workspace: DirectoryStatus,
    /// Required directories that were created.
    pub created: Vec<PathBuf>,
    /// Required directories that already existed.
    pub existing: Vec<PathBuf>,
}

/// Create `path` (and parents) unless it is already a directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn make_directory(path: &Path) -> WorkspaceResult<DirectoryStatus> {
    if path.is_dir() {
        return Ok(DirectoryStatus {
            status: DirState::Exists,
            path: path.to_path_buf(),
            message: format!("Directory already exists at {}", path.display()),
        });
    }

    std::fs::create_dir_all(path)?;
    Ok(DirectoryStatus {
        status: DirState::Created,
        path: path.to_path_buf(),
        message: format!("Successfully created directory at {}", path.display()),
    })
}
