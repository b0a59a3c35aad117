//! ArchLens integration: run the CLI and edit `archlens.json`.
//!
//! Every tool works in the current workspace location, which should be a
//! repository checkout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, required_str};

/// Config file ArchLens reads from the repository root.
const CONFIG_FILE: &str = "archlens.json";

fn default_save_location() -> String {
    "./diagrams/".to_string()
}

/// Contents of `archlens.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchLensConfig {
    /// Project name.
    pub name: String,
    /// Folder whose packages are analysed.
    #[serde(rename = "rootFolder")]
    pub root_folder: String,
    /// View name -> `{"packages": [{"path": .., "depth": ..}]}`.
    pub views: BTreeMap<String, BTreeMap<String, Vec<Map<String, Value>>>>,
    /// Where rendered views are written.
    #[serde(rename = "saveLocation", default = "default_save_location")]
    pub save_location: String,
}

impl ArchLensConfig {
    /// Add or replace a single-package view.
    pub fn add_view(&mut self, view: impl Into<String>, path: impl Into<String>, depth: u64) {
        let mut package = Map::new();
        package.insert("path".to_string(), Value::String(path.into()));
        package.insert("depth".to_string(), Value::from(depth));

        let mut entry = BTreeMap::new();
        entry.insert("packages".to_string(), vec![package]);
        self.views.insert(view.into(), entry);
    }

    async fn load(path: &Path) -> Result<Self, ToolError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ToolError::Other(
                "archlens.json does not exist. Please run init_archlens first.".to_string(),
            ));
        }
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw)
            .map_err(|e| ToolError::ExecutionFailed(format!("invalid {CONFIG_FILE}: {e}")))
    }

    async fn save(&self, path: &Path) -> Result<(), ToolError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ToolError::Other(e.to_string()))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

fn config_path(ctx: &ToolContext) -> PathBuf {
    ctx.workspace.current().join(CONFIG_FILE)
}

/// Run `archlens <subcommand>` in `dir` and return its exit code.
async fn run_archlens(ctx: &ToolContext, dir: &Path, subcommand: &str) -> Result<i32, ToolError> {
    let binary = which::which(&ctx.settings.archlens_command).map_err(|e| {
        ToolError::ExecutionFailed(format!(
            "{} executable not found: {e}",
            ctx.settings.archlens_command
        ))
    })?;

    debug!(binary = %binary.display(), dir = %dir.display(), subcommand, "Running archlens");
    let status = Command::new(binary)
        .arg(subcommand)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    Ok(status.code().unwrap_or(-1))
}

/// Initialise ArchLens in the current repository.
pub struct InitArchLensTool;

#[async_trait::async_trait]
impl BuiltinTool for InitArchLensTool {
    fn name(&self) -> &'static str {
        "init_archlens"
    }

    fn description(&self) -> &'static str {
        "Initializes archLens in the current directory, which should be a repository."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        let dir = ctx.workspace.current();
        let in_repositories = dir
            .strip_prefix(ctx.layout.repositories_dir())
            .is_ok_and(|rel| rel.components().next().is_some());
        if !(in_repositories || dir.join(".git").exists()) {
            return Err(ToolError::Other(format!(
                "Current directory ({}) doesn't appear to be a repository. Please navigate to a repository first.",
                dir.display()
            )));
        }

        if dir.join(CONFIG_FILE).exists() {
            return Ok(format!(
                "archlens.json already exists in {}, skipping initialization.",
                dir.display()
            ));
        }

        match run_archlens(ctx, &dir, "init").await? {
            0 => {
                info!(dir = %dir.display(), "Initialized archLens");
                Ok(format!("Successfully initialized archLens in {}", dir.display()))
            },
            code => Err(ToolError::Other(format!(
                "archLens init failed with exit code {code}"
            ))),
        }
    }
}

/// Render the configured ArchLens views.
pub struct RunArchLensTool;

#[async_trait::async_trait]
impl BuiltinTool for RunArchLensTool {
    fn name(&self) -> &'static str {
        "run_archlens"
    }

    fn description(&self) -> &'static str {
        "Runs archLens render in the current directory, which must contain archlens.json."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        let dir = ctx.workspace.current();
        if !dir.join(CONFIG_FILE).exists() {
            return Err(ToolError::Other(format!(
                "archlens.json does not exist in {}. Please make sure you're in a repository directory and run init_archlens first.",
                dir.display()
            )));
        }

        match run_archlens(ctx, &dir, "render").await? {
            0 => Ok(format!("Successfully ran archLens in {}", dir.display())),
            code => Err(ToolError::Other(format!(
                "archLens render failed with exit code {code}"
            ))),
        }
    }
}

/// Return `archlens.json` from the current location.
pub struct ReadArchLensConfigTool;

#[async_trait::async_trait]
impl BuiltinTool for ReadArchLensConfigTool {
    fn name(&self) -> &'static str {
        "read_archlens_config"
    }

    fn description(&self) -> &'static str {
        "Reads archlens.json in the current directory."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        let config = ArchLensConfig::load(&config_path(ctx)).await?;
        serde_json::to_string_pretty(&config).map_err(|e| ToolError::Other(e.to_string()))
    }
}

/// Replace `archlens.json` in the current location.
pub struct WriteArchLensConfigTool;

#[async_trait::async_trait]
impl BuiltinTool for WriteArchLensConfigTool {
    fn name(&self) -> &'static str {
        "write_archlens_config"
    }

    fn description(&self) -> &'static str {
        "Writes archlens.json in the current directory. Views map a view name to \
         {\"packages\": [{\"path\": \"*\", \"depth\": 1}]}."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "config": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "rootFolder": { "type": "string" },
                        "views": { "type": "object" },
                        "saveLocation": { "type": "string" }
                    },
                    "required": ["name", "rootFolder", "views"]
                }
            },
            "required": ["config"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let raw = args
            .get("config")
            .cloned()
            .ok_or_else(|| ToolError::InvalidArguments("config is required".into()))?;
        let config: ArchLensConfig = serde_json::from_value(raw)
            .map_err(|e| ToolError::InvalidArguments(format!("invalid config: {e}")))?;
        config.save(&config_path(ctx)).await?;
        Ok("Wrote to config file".to_string())
    }
}

/// Add a single-package view to `archlens.json`.
pub struct AddArchLensViewTool;

#[async_trait::async_trait]
impl BuiltinTool for AddArchLensViewTool {
    fn name(&self) -> &'static str {
        "add_archlens_view"
    }

    fn description(&self) -> &'static str {
        "Adds (or replaces) a view in archlens.json covering one package path to a given depth."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "package_name": {
                    "type": "string",
                    "description": "View name"
                },
                "path": {
                    "type": "string",
                    "description": "Package path, '*' for the root folder"
                },
                "depth": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "How many package levels to show"
                }
            },
            "required": ["package_name", "path", "depth"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let view = required_str(&args, "package_name")?;
        let package_path = required_str(&args, "path")?;
        let depth = args
            .get("depth")
            .and_then(Value::as_u64)
            .ok_or_else(|| ToolError::InvalidArguments("depth is required".into()))?;

        let path = config_path(ctx);
        let mut config = ArchLensConfig::load(&path).await?;
        config.add_view(view, package_path, depth);
        config.save(&path).await?;
        Ok(format!("Added view '{view}' to archlens.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToolSettings;
    use crate::test_support;

    fn in_repo() -> (tempfile::TempDir, ToolContext, PathBuf) {
        let (dir, ctx) = test_support::workspace();
        let repo = ctx.layout.repositories_dir().join("app");
        std::fs::create_dir_all(&repo).unwrap();
        ctx.workspace.navigate_to_repository("app").unwrap();
        (dir, ctx, repo)
    }

    fn without_archlens(ctx: ToolContext) -> ToolContext {
        let settings = ToolSettings {
            archlens_command: "archrecon-no-such-archlens".to_string(),
            ..(*ctx.settings).clone()
        };
        ToolContext::new(ctx.workspace, settings)
    }

    #[test]
    fn test_config_uses_archlens_field_names() {
        let mut config = ArchLensConfig {
            name: "demo".into(),
            root_folder: "src".into(),
            views: BTreeMap::new(),
            save_location: default_save_location(),
        };
        config.add_view("top-level", "*", 1);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["rootFolder"], "src");
        assert_eq!(value["saveLocation"], "./diagrams/");
        assert_eq!(value["views"]["top-level"]["packages"][0]["depth"], 1);
    }

    #[test]
    fn test_save_location_defaults() {
        let config: ArchLensConfig =
            serde_json::from_value(json!({"name": "n", "rootFolder": "r", "views": {}})).unwrap();
        assert_eq!(config.save_location, "./diagrams/");
    }

    #[tokio::test]
    async fn test_write_read_and_add_view() {
        let (_dir, ctx, repo) = in_repo();

        let out = WriteArchLensConfigTool
            .execute(
                json!({"config": {"name": "app", "rootFolder": "src", "views": {}}}),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(out, "Wrote to config file");
        assert!(repo.join("archlens.json").exists());

        AddArchLensViewTool
            .execute(json!({"package_name": "core", "path": "core", "depth": 2}), &ctx)
            .await
            .unwrap();

        let read = ReadArchLensConfigTool.execute(json!({}), &ctx).await.unwrap();
        let value: Value = serde_json::from_str(&read).unwrap();
        assert_eq!(value["views"]["core"]["packages"][0]["path"], "core");
    }

    #[tokio::test]
    async fn test_read_missing_config() {
        let (_dir, ctx, _repo) = in_repo();
        let err = ReadArchLensConfigTool.execute(json!({}), &ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "archlens.json does not exist. Please run init_archlens first."
        );
    }

    #[tokio::test]
    async fn test_init_outside_repository() {
        let (_dir, ctx) = test_support::workspace();
        let err = InitArchLensTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(err.to_string().contains("doesn't appear to be a repository"));
    }

    #[tokio::test]
    async fn test_init_skips_existing_config() {
        let (_dir, ctx, repo) = in_repo();
        std::fs::write(repo.join("archlens.json"), "{}").unwrap();
        let out = InitArchLensTool.execute(json!({}), &ctx).await.unwrap();
        assert!(out.contains("skipping initialization"));
    }

    #[tokio::test]
    async fn test_run_requires_config() {
        let (_dir, ctx, _repo) = in_repo();
        let err = RunArchLensTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(err.to_string().contains("run init_archlens first"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let (_dir, ctx, repo) = in_repo();
        let ctx = without_archlens(ctx);
        std::fs::write(repo.join("archlens.json"), "{}").unwrap();
        let err = RunArchLensTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(err.to_string().contains("executable not found"));
    }
}
