//! Settings shared by the built-in tools.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service endpoints, limits and external commands used by the tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// PlantUML server base URL.
    pub plantuml_server_url: String,
    /// PlantUML request timeout in seconds.
    pub plantuml_timeout_secs: u64,
    /// Diagrams directory, relative to the workspace root.
    pub diagrams_dir: String,
    /// Files larger than this many bytes are left out of extractions.
    pub max_file_size: u64,
    /// Extra glob patterns left out of extractions.
    pub exclude: Vec<String>,
    /// Keep files matched by ignore files in extractions.
    pub include_gitignored: bool,
    /// Git executable.
    pub git_command: String,
    /// ArchLens executable.
    pub archlens_command: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            plantuml_server_url: "http://localhost:1234/plantuml".to_string(),
            plantuml_timeout_secs: 20,
            diagrams_dir: "diagrams".to_string(),
            max_file_size: 10_485_760,
            exclude: Vec::new(),
            include_gitignored: false,
            git_command: "git".to_string(),
            archlens_command: "archlens".to_string(),
        }
    }
}

impl ToolSettings {
    /// PlantUML request timeout.
    #[must_use]
    pub fn plantuml_timeout(&self) -> Duration {
        Duration::from_secs(self.plantuml_timeout_secs)
    }

    /// Set the PlantUML server URL.
    #[must_use]
    pub fn with_plantuml_server(mut self, url: impl Into<String>) -> Self {
        self.plantuml_server_url = url.into();
        self
    }
}
