//! Read a UTF-8 file inside the workspace.

use serde_json::{Value, json};

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, required_str, truncate_output};

/// Read a file relative to the current location.
pub struct ReadFileTool;

#[async_trait::async_trait]
impl BuiltinTool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Reads a text file. Relative paths start at the current location; the file must be inside the workspace."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let raw = required_str(&args, "file_path")?;
        let path = ctx.resolve_inside(raw)?;

        if !path.exists() {
            return Err(ToolError::PathNotFound(path.display().to_string()));
        }
        if path.is_dir() {
            return Err(ToolError::InvalidArguments(format!(
                "{} is a directory",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ToolError::ExecutionFailed(format!("Error reading file {raw}: {e}"))
        })?;
        Ok(truncate_output(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_reads_relative_to_current_location() {
        let (_dir, ctx) = test_support::workspace();
        let repo = ctx.layout.repositories_dir().join("app");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(repo.join("README.md"), "# app\n").unwrap();
        ctx.workspace.navigate_to_repository("app").unwrap();

        let out = ReadFileTool
            .execute(json!({"file_path": "README.md"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, "# app\n");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, ctx) = test_support::workspace();
        let err = ReadFileTool
            .execute(json!({"file_path": "nope.txt"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_outside_workspace() {
        let (_dir, ctx) = test_support::workspace();
        let err = ReadFileTool
            .execute(json!({"file_path": "/etc/hostname"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("outside the allowed workspace"));
    }

    #[tokio::test]
    async fn test_non_utf8_file() {
        let (_dir, ctx) = test_support::workspace();
        std::fs::write(ctx.workspace.root().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let err = ReadFileTool
            .execute(json!({"file_path": "blob.bin"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Error reading file blob.bin"));
    }
}
