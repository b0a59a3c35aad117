//! Navigation tools over the workspace location.

use serde_json::{Value, json};

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, required_str};

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

/// List the entries at the current location.
pub struct ListDirectoryTool;

#[async_trait::async_trait]
impl BuiltinTool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "Lists the files and directories at the current location, sorted by name."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        let names = ctx.workspace.list_directory()?;
        serde_json::to_string(&names).map_err(|e| ToolError::Other(e.to_string()))
    }
}

/// Report the current location.
pub struct GetCurrentDirectoryTool;

#[async_trait::async_trait]
impl BuiltinTool for GetCurrentDirectoryTool {
    fn name(&self) -> &'static str {
        "get_current_directory"
    }

    fn description(&self) -> &'static str {
        "Returns the current location inside the workspace."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        Ok(ctx.workspace.current_directory().display().to_string())
    }
}

/// Move to another directory inside the workspace.
pub struct ChangeDirectoryTool;

#[async_trait::async_trait]
impl BuiltinTool for ChangeDirectoryTool {
    fn name(&self) -> &'static str {
        "change_directory"
    }

    fn description(&self) -> &'static str {
        "Changes the current location. Accepts an absolute path, a path relative to \
         the current location, or the name of a cloned repository."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Target directory or repository name"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = required_str(&args, "path")?;
        let target = ctx.workspace.change_directory(path)?;
        Ok(format!("Successfully changed to: {}", target.display()))
    }
}

/// Move straight into a cloned repository.
pub struct NavigateToRepositoryTool;

#[async_trait::async_trait]
impl BuiltinTool for NavigateToRepositoryTool {
    fn name(&self) -> &'static str {
        "navigate_to_repository"
    }

    fn description(&self) -> &'static str {
        "Moves the current location to a repository under repositories/."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": {
                    "type": "string",
                    "description": "Repository name (e.g. 'app' or 'app/main')"
                }
            },
            "required": ["repo_name"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let name = required_str(&args, "repo_name")?;
        let target = ctx.workspace.navigate_to_repository(name)?;
        Ok(format!(
            "Successfully navigated to repository: {}",
            target.display()
        ))
    }
}

/// List cloned repositories.
pub struct ListRepositoriesTool;

#[async_trait::async_trait]
impl BuiltinTool for ListRepositoriesTool {
    fn name(&self) -> &'static str {
        "list_repositories"
    }

    fn description(&self) -> &'static str {
        "Lists the repositories cloned into the workspace."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult {
        let repos = ctx.workspace.list_repositories()?;
        if repos.is_empty() {
            Ok("No repositories found in workspace.".to_string())
        } else {
            Ok(format!("Available repositories: {}", repos.join(", ")))
        }
    }
}
