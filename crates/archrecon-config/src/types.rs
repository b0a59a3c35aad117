//! Configuration struct definitions.
//!
//! Every section derives `Default` with the same values as the embedded
//! `defaults.toml`, so a partially written file still deserializes.

use serde::{Deserialize, Serialize};

use crate::env::WORKSPACE_ROOT_ENV;
use crate::error::{ConfigError, ConfigResult};

/// Fully merged archrecon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace root.
    pub workspace: WorkspaceSection,
    /// PlantUML rendering service.
    pub plantuml: PlantUmlSection,
    /// Where diagrams are saved.
    pub diagrams: DiagramsSection,
    /// Repository extraction limits.
    pub extraction: ExtractionSection,
    /// Human review of tool calls.
    pub approval: ApprovalSection,
    /// External MCP server configuration.
    pub mcp: McpSection,
    /// Logging.
    pub logging: LoggingSection,
}

impl Config {
    /// The configured workspace root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvironmentVariable`] if neither the
    /// config nor `AGENT_WORKSPACE_BASE_PATH` provides one.
    pub fn workspace_root(&self) -> ConfigResult<&str> {
        self.workspace
            .root
            .as_deref()
            .filter(|root| !root.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                name: WORKSPACE_ROOT_ENV.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// WorkspaceSection
// ---------------------------------------------------------------------------

/// Workspace location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// Root of the agent workspace, in any supported spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

// ---------------------------------------------------------------------------
// PlantUmlSection
// ---------------------------------------------------------------------------

/// PlantUML rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantUmlSection {
    /// Base URL of the server, without a trailing format segment.
    pub server_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PlantUmlSection {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:1234/plantuml".to_owned(),
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// DiagramsSection
// ---------------------------------------------------------------------------

/// Diagram storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramsSection {
    /// Directory for `.puml` files, relative to the workspace root.
    pub directory: String,
}

impl Default for DiagramsSection {
    fn default() -> Self {
        Self {
            directory: "diagrams".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractionSection
// ---------------------------------------------------------------------------

/// Repository extraction limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Extra glob patterns to leave out.
    pub exclude: Vec<String>,
    /// Include files matched by `.gitignore` / `.gitingestignore`.
    pub include_gitignored: bool,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            max_file_size: 10_485_760,
            exclude: Vec::new(),
            include_gitignored: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Which tool calls need a human decision, and which decisions are offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Master switch. When off, no tool is reviewed.
    pub enabled: bool,
    /// `"default"`, `"permissive"` or `"unrestricted"`.
    pub policy: String,
    /// Tools to review.
    pub tools: Vec<String>,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: "permissive".to_owned(),
            tools: [
                "git_clone",
                "create_uml_diagram",
                "update_uml",
                "save_uml",
                "export_uml",
                "extract_repository_details",
                "init_archlens",
                "run_archlens",
                "write_archlens_config",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// McpSection
// ---------------------------------------------------------------------------

/// External MCP server configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSection {
    /// JSON file holding server connection parameters.
    pub config_file: String,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            config_file: "mcp_servers_config.json".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"` or `"json"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["archrecon_tools=debug"]`).
    pub directives: Vec<String>,
    /// Also write a daily log file under `<workspace>/logs`.
    pub to_file: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            to_file: false,
        }
    }
}
