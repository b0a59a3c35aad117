//! MCP server configuration file.
//!
//! The file is an opaque JSON mapping of server name to connection
//! parameters. It is only ever written redacted; real credentials are
//! referenced by environment variable name and filled in by
//! [`resolve_environment`](crate::env::resolve_environment) at connect time.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::sanitize::ConfigSanitizer;

/// Outcome of [`save_mcp_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStatus {
    /// Saved without changes.
    Success,
    /// Saved, but some values were redacted first.
    Warning,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

/// Status report returned to the caller of [`save_mcp_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    /// Success or warning.
    #[serde(rename = "Status")]
    pub status: SaveStatus,
    /// Human-readable detail.
    #[serde(rename = "Message")]
    pub message: String,
}

/// Load the MCP server config, creating an empty `{}` file if none exists.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be created, read or parsed.
pub fn load_mcp_config(path: &Path) -> ConfigResult<Value> {
    if !path.exists() {
        std::fs::write(path, "{}").map_err(|e| ConfigError::WriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        info!(path = %path.display(), "created empty MCP server config");
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::JsonError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Redact secrets from `config` and write it to `path` as indented JSON.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be written.
pub fn save_mcp_config(config: &Value, path: &Path) -> ConfigResult<SaveReport> {
    let mut sanitizer = ConfigSanitizer::new();
    let sanitized = sanitizer.sanitize(config);

    let json = serde_json::to_string_pretty(&sanitized).map_err(|e| ConfigError::JsonError {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ConfigError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let leaks = sanitizer.unique_leaks();
    if leaks.is_empty() {
        info!(path = %path.display(), "saved MCP server config");
        return Ok(SaveReport {
            status: SaveStatus::Success,
            message: format!("Configuration saved successfully at: {}", path.display()),
        });
    }

    warn!(path = %path.display(), count = leaks.len(), "redacted secrets from MCP server config");
    Ok(SaveReport {
        status: SaveStatus::Warning,
        message: format!(
            "Potential secret values detected and redacted in the following config paths: {}. \
             Values have been redacted in the saved file.",
            leaks.join(", ")
        ),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_load_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp_servers_config.json");

        let config = load_mcp_config(&path).unwrap();
        assert_eq!(config, json!({}));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_mcp_config(&path),
            Err(ConfigError::JsonError { .. })
        ));
    }

    #[test]
    fn test_save_clean_config_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        let config = json!({"github": {"env": {"GITHUB_TOKEN": "GH_PAT"}}});

        let report = save_mcp_config(&config, &path).unwrap();
        assert_eq!(report.status, SaveStatus::Success);
        assert_eq!(
            report.message,
            format!("Configuration saved successfully at: {}", path.display())
        );
        assert_eq!(load_mcp_config(&path).unwrap(), config);
    }

    #[test]
    fn test_save_redacts_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        let config = json!({
            "search": {"api_key": "sk-12345", "url": "https://search.example"},
            "db": {"password": "hunter2"}
        });

        let report = save_mcp_config(&config, &path).unwrap();
        assert_eq!(report.status, SaveStatus::Warning);
        assert_eq!(
            report.message,
            "Potential secret values detected and redacted in the following config paths: \
             db.password, search.api_key. Values have been redacted in the saved file."
        );

        let saved = load_mcp_config(&path).unwrap();
        assert_eq!(saved["search"]["api_key"], "<REDACTED>");
        assert_eq!(saved["search"]["url"], "https://search.example");
        assert!(!std::fs::read_to_string(&path).unwrap().contains("hunter2"));
    }

    #[test]
    fn test_report_serializes_capitalized() {
        let report = SaveReport {
            status: SaveStatus::Success,
            message: "ok".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"Status": "Success", "Message": "ok"})
        );
    }
}
