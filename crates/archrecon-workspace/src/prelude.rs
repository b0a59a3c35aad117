//! Prelude module - commonly used types for convenient import.
//!
//! Use `use archrecon_workspace::prelude::*;` to import all essential types.

// Boundary checking
pub use crate::{BoundaryViolation, GuardError, WorkspaceContext, WorkspaceRoot, is_within};

// Layout
pub use crate::{WorkspaceLayout, RepositoryIndex, RepositoryWorkspaceEntry};

// Errors
pub use crate::{WorkspaceError, WorkspaceResult};
