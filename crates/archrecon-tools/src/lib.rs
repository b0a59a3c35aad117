#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Built-in tools for repository reconstruction.
//!
//! Every tool runs against an explicit [`ToolContext`] (workspace root,
//! current location, layout and settings) rather than process-wide state.
//! Calls go through the [`ToolDispatcher`], which consults the interrupt
//! registry and parks reviewed calls at the approval gate.
//!
//! # Example
//!
//! ```rust,no_run
//! use archrecon_approval::AutoApproveHandler;
//! use archrecon_tools::{ToolContext, ToolDispatcher, ToolSettings};
//! use archrecon_workspace::{WorkspaceContext, WorkspaceRoot};
//!
//! # async fn run() {
//! let workspace = WorkspaceContext::new(WorkspaceRoot::new("/srv/agent-workspace"));
//! let ctx = ToolContext::new(workspace, ToolSettings::default());
//! let dispatcher = ToolDispatcher::with_defaults(ctx);
//!
//! let output = dispatcher
//!     .call("list_repositories", serde_json::json!({}), &AutoApproveHandler)
//!     .await;
//! println!("{}", output.content);
//! # }
//! ```

mod archlens;
mod dispatcher;
mod extract;
mod git_clone;
mod navigation;
pub mod plantuml;
mod read_file;
mod settings;
mod uml;

pub use archlens::{
    AddArchLensViewTool, ArchLensConfig, InitArchLensTool, ReadArchLensConfigTool,
    RunArchLensTool, WriteArchLensConfigTool,
};
pub use dispatcher::{DispatchOutcome, ToolDispatcher, ToolOutput};
pub use extract::{
    ExtractRepositoryTool, ExtractionArtifact, ExtractionOptions, LoadExtractedRepositoryTool,
    ingest,
};
pub use git_clone::{CloneReport, GitCloneTool};
pub use navigation::{
    ChangeDirectoryTool, GetCurrentDirectoryTool, ListDirectoryTool, ListRepositoriesTool,
    NavigateToRepositoryTool,
};
pub use read_file::ReadFileTool;
pub use settings::ToolSettings;
pub use uml::{
    CreateUmlDiagramTool, ExportUmlTool, LoadUmlTool, SaveUmlTool, UpdateUmlTool,
    ensure_uml_tags,
};

use archrecon_workspace::{WorkspaceContext, WorkspaceError, WorkspaceLayout};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Maximum output size in characters before truncation.
const MAX_OUTPUT_CHARS: usize = 30_000;

/// A built-in tool that executes directly in-process.
#[async_trait::async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Tool name, also the key for its interrupt policy.
    fn name(&self) -> &'static str;

    /// Human-readable description for the agent.
    fn description(&self) -> &'static str;

    /// JSON schema for tool input parameters.
    fn input_schema(&self) -> Value;

    /// Whether the tool reads or writes files, and so must run inside the
    /// workspace guard.
    fn touches_filesystem(&self) -> bool {
        true
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// Shared context available to all built-in tools.
///
/// Clones share the workspace location.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Workspace root and current location.
    pub workspace: WorkspaceContext,
    /// Named directories under the root.
    pub layout: WorkspaceLayout,
    /// Service endpoints and limits.
    pub settings: Arc<ToolSettings>,
}

impl ToolContext {
    /// Create a context whose layout follows the workspace root and the
    /// configured diagrams directory.
    #[must_use]
    pub fn new(workspace: WorkspaceContext, settings: ToolSettings) -> Self {
        let layout =
            WorkspaceLayout::new(workspace.root()).with_diagrams_dir(&settings.diagrams_dir);
        Self {
            workspace,
            layout,
            settings: Arc::new(settings),
        }
    }

    /// Resolve `raw` against the current location and require the result to
    /// stay inside the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Workspace`] if the path escapes the root.
    pub fn resolve_inside(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let path = self.workspace.resolve(raw);
        if self.workspace.contains(&path) {
            Ok(path)
        } else {
            Err(WorkspaceError::OutsideWorkspace { path }.into())
        }
    }
}

/// Tool execution errors.
///
/// The dispatcher reports these as `Error: <message>`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Path not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Timeout.
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The rendering service answered with an error or could not be reached.
    #[error("{0}")]
    Http(String),

    /// Workspace containment or navigation failure.
    #[error("{0}")]
    Workspace(#[from] WorkspaceError),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for tool execution.
pub type ToolResult = Result<String, ToolError>;

/// Registry of built-in tools.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn BuiltinTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Create a registry with all default tools registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // Repositories
        registry.register(Arc::new(GitCloneTool));
        registry.register(Arc::new(ExtractRepositoryTool));
        registry.register(Arc::new(LoadExtractedRepositoryTool));
        // Navigation
        registry.register(Arc::new(ListDirectoryTool));
        registry.register(Arc::new(GetCurrentDirectoryTool));
        registry.register(Arc::new(ChangeDirectoryTool));
        registry.register(Arc::new(NavigateToRepositoryTool));
        registry.register(Arc::new(ListRepositoriesTool));
        registry.register(Arc::new(ReadFileTool));
        // Diagrams
        registry.register(Arc::new(CreateUmlDiagramTool));
        registry.register(Arc::new(UpdateUmlTool));
        registry.register(Arc::new(SaveUmlTool));
        registry.register(Arc::new(LoadUmlTool));
        registry.register(Arc::new(ExportUmlTool));
        // ArchLens
        registry.register(Arc::new(InitArchLensTool));
        registry.register(Arc::new(RunArchLensTool));
        registry.register(Arc::new(ReadArchLensConfigTool));
        registry.register(Arc::new(WriteArchLensConfigTool));
        registry.register(Arc::new(AddArchLensViewTool));
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn BuiltinTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn BuiltinTool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Registered tools, sorted by name.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn BuiltinTool>> {
        self.tools.values()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate output to stay within the agent's context limits.
///
/// If `output` exceeds [`MAX_OUTPUT_CHARS`] bytes it is cut at the nearest
/// char boundary below the limit and a notice is appended.
#[must_use]
pub fn truncate_output(output: String) -> String {
    if output.len() <= MAX_OUTPUT_CHARS {
        return output;
    }
    let mut cut = MAX_OUTPUT_CHARS;
    while !output.is_char_boundary(cut) {
        cut = cut.saturating_sub(1);
    }
    let mut truncated = output.get(..cut).unwrap_or_default().to_string();
    truncated.push_str("\n\n... (output truncated, exceeded 30000 character limit)");
    truncated
}

/// Required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("{key} is required")))
}

/// Optional string argument. Blank strings count as absent.
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Optional boolean argument, `false` when absent.
pub(crate) fn flag(args: &Value, key: &str) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use archrecon_workspace::WorkspaceRoot;
    use tempfile::TempDir;

    /// A temp workspace with the standard layout, positioned at its root.
    pub(crate) fn workspace() -> (TempDir, ToolContext) {
        let dir = tempfile::tempdir().unwrap();
        let root = WorkspaceRoot::new(dir.path().to_str().unwrap());
        let ctx = ToolContext::new(WorkspaceContext::new(root), ToolSettings::default());
        ctx.layout.setup().unwrap();
        (dir, ctx)
    }
}
