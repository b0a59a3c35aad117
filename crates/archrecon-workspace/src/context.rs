//! Explicit workspace context: the root plus the agent's current location.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::boundaries::{BoundaryViolation, WorkspaceRoot};
use crate::error::WorkspaceResult;
use crate::normalize::{lexical_clean, normalize_from, normalize_strict_from};

/// The root and current location one agent operates with.
///
/// Clones share the same current location. Use [`WorkspaceContext::fork`]
/// to give another agent its own.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    root: Arc<WorkspaceRoot>,
    current: Arc<RwLock<PathBuf>>,
}

impl WorkspaceContext {
    /// Create a context positioned at the workspace root.
    #[must_use]
    pub fn new(root: WorkspaceRoot) -> Self {
        let current = Arc::new(RwLock::new(root.path().to_path_buf()));
        Self {
            root: Arc::new(root),
            current,
        }
    }

    /// Create an independent context on the same root, at the same location.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            current: Arc::new(RwLock::new(self.current())),
        }
    }

    /// Get the workspace root.
    #[must_use]
    pub fn workspace_root(&self) -> &WorkspaceRoot {
        &self.root
    }

    /// Get the workspace root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Get the current location.
    #[must_use]
    pub fn current(&self) -> PathBuf {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Move the current location.
    ///
    /// `.` and `..` segments are folded before storing. No containment check
    /// happens here. Navigation checks before calling, and the guard catches
    /// anything that slips through.
    pub fn set_current(&self, path: PathBuf) {
        let path = lexical_clean(&path);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = path;
    }

    /// Normalize `raw` against the current location.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> PathBuf {
        normalize_from(raw, &self.current())
    }

    /// Strictly normalize `raw` against the current location.
    ///
    /// # Errors
    ///
    /// Returns an error if any component of the path does not exist.
    pub fn resolve_strict(&self, raw: &str) -> WorkspaceResult<PathBuf> {
        normalize_strict_from(raw, &self.current())
    }

    /// Check if a normalized path is inside the workspace.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.root.contains(path)
    }

    /// Check if the current location is inside the workspace.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.contains(&self.current())
    }

    /// Reset to the root if the current location has left the workspace.
    ///
    /// Returns the violation when a reset happened. Calling this while inside
    /// never changes anything.
    pub fn reset_if_outside(&self) -> Option<BoundaryViolation> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if self.root.contains(&current) {
            return None;
        }

        let location = std::mem::replace(&mut *current, self.root.path().to_path_buf());
        warn!(
            location = %location.display(),
            root = %self.root,
            "Location outside workspace, returned to root"
        );
        Some(BoundaryViolation {
            root: self.root.path().to_path_buf(),
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> WorkspaceContext {
        WorkspaceContext::new(WorkspaceRoot::from_normalized(PathBuf::from("/ws")))
    }

    #[test]
    fn test_starts_at_root() {
        let ctx = ctx();
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
        assert!(ctx.is_inside());
    }

    #[test]
    fn test_reset_when_outside() {
        let ctx = ctx();
        ctx.set_current(PathBuf::from("/other"));

        let violation = ctx.reset_if_outside().unwrap();
        assert_eq!(violation.location, PathBuf::from("/other"));
        assert!(violation.to_string().contains("outside the agent workspace"));
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }

    #[test]
    fn test_parent_segments_cannot_hide_escape() {
        let ctx = ctx();
        ctx.set_current(PathBuf::from("/ws/../etc"));
        assert_eq!(ctx.current(), PathBuf::from("/etc"));
        assert!(!ctx.is_inside());

        let violation = ctx.reset_if_outside().unwrap();
        assert_eq!(violation.location, PathBuf::from("/etc"));
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }

    #[test]
    fn test_post_check_is_idempotent_inside() {
        let ctx = ctx();
        ctx.set_current(PathBuf::from("/ws/sub/dir"));

        assert!(ctx.reset_if_outside().is_none());
        assert!(ctx.reset_if_outside().is_none());
        assert_eq!(ctx.current(), PathBuf::from("/ws/sub/dir"));
    }

    #[test]
    fn test_clones_share_location_forks_do_not() {
        let ctx = ctx();
        let shared = ctx.clone();
        let forked = ctx.fork();

        shared.set_current(PathBuf::from("/ws/a"));
        assert_eq!(ctx.current(), PathBuf::from("/ws/a"));
        assert_eq!(forked.current(), PathBuf::from("/ws"));
    }
}
