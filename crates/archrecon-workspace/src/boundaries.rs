//! Workspace boundary checking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::normalize::{lexical_clean, normalize};

/// Whether `path` equals `root` or lies beneath it.
///
/// Comparison is component-wise: `/ws2` is not within `/ws`. `.` and `..`
/// segments are folded first, so `/ws/../etc` is not within `/ws`.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    lexical_clean(path).starts_with(lexical_clean(root))
}

/// The single directory tree all sandboxed operations must stay inside.
///
/// Normalized once at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    /// Normalize `raw` and use it as the workspace root.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    /// Use an already-normalized path as the root.
    #[must_use]
    pub fn from_normalized(path: PathBuf) -> Self {
        Self(path)
    }

    /// Get the root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Check if a normalized path is inside this root.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        is_within(path, &self.0)
    }
}

impl fmt::Display for WorkspaceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for WorkspaceRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// A containment violation detected by the guard.
///
/// By the time one of these exists the location has already been reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryViolation {
    /// The root the location was reset to.
    pub root: PathBuf,
    /// Where the location was when the violation was detected.
    pub location: PathBuf,
}

impl fmt::Display for BoundaryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: Operation is outside the agent workspace. Returned to root: {}",
            self.root.display()
        )
    }
}
