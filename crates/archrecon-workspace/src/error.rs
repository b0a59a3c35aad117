//! Workspace error types.

use std::path::PathBuf;

/// Errors raised by workspace operations.
///
/// Messages carry no `Error:` prefix; reporting layers add it.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Strict resolution hit a component that does not exist.
    #[error("Cannot resolve path '{}': a component does not exist", .path.display())]
    PathResolution {
        /// The path as it was being resolved.
        path: PathBuf,
    },

    /// The target lies outside the workspace root.
    #[error("Access to '{}' is outside the allowed workspace", .path.display())]
    OutsideWorkspace {
        /// The offending target.
        path: PathBuf,
    },

    /// The target does not exist.
    #[error("Path '{}' does not exist", .path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The target exists but is not a directory.
    #[error("'{}' is not a directory", .path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// No repository with that name has been cloned.
    #[error("Repository '{name}' not found at {}", .path.display())]
    RepositoryNotFound {
        /// Repository name as requested.
        name: String,
        /// Where it was looked for.
        path: PathBuf,
    },

    /// The repository index file could not be parsed or written.
    #[error("invalid repository index at {}: {source}", .path.display())]
    Index {
        /// Index file location.
        path: PathBuf,
        /// Underlying serialization error.
        source: serde_json::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for workspace operations.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
