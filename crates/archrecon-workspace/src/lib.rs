//! Archrecon Workspace - the sandbox every agent filesystem operation runs in.
//!
//! This crate owns the single directory tree the agent is allowed to touch
//! and the machinery that keeps it there.
//!
//! # Key Concepts
//!
//! - **Workspace root**: an absolute, normalized path fixed at startup
//! - **Workspace context**: the root plus a mutable "current location", passed
//!   explicitly to every sandboxed operation instead of relying on the process cwd
//! - **Guard**: wraps an operation with a containment check before and after it
//!   runs, resetting the location to the root on violation
//! - **Layout**: the `repositories/`, `temp/repositories/`, `logs/` and
//!   `diagrams/` directories under the root
//!
//! # Example
//!
//! ```rust,ignore
//! use archrecon_workspace::{WorkspaceContext, WorkspaceRoot};
//!
//! let root = WorkspaceRoot::new("/mnt/c/agent-workspace");
//! let ctx = WorkspaceContext::new(root);
//!
//! let listing = ctx.enforce(|ctx| ctx.list_directory())?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod boundaries;
pub mod context;
pub mod error;
pub mod guard;
pub mod layout;
pub mod navigation;
pub mod normalize;
pub mod repository;

pub use boundaries::{BoundaryViolation, WorkspaceRoot, is_within};
pub use context::WorkspaceContext;
pub use error::{WorkspaceError, WorkspaceResult};
pub use guard::GuardError;
pub use layout::{DirState, DirectoryStatus, SetupReport, WorkspaceLayout};
pub use normalize::{normalize, normalize_from, normalize_strict, normalize_strict_from};
pub use repository::{RepositoryIndex, RepositoryWorkspaceEntry};
