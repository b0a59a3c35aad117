//! UML diagram tools: create, update, save, load and export `.puml` files.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::plantuml::{ExportFormat, PlantUmlClient};
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, flag, optional_str, required_str};

const START_TAG: &str = "@startuml";
const END_TAG: &str = "@enduml";

/// Wrap `content` in `@startuml <name>` / `@enduml` where either tag is
/// missing.
#[must_use]
pub fn ensure_uml_tags(content: &str, name: &str) -> String {
    let mut full = if content.starts_with(START_TAG) {
        content.to_string()
    } else {
        format!("{START_TAG} {name}\n{content}")
    };
    if !full.trim_end().ends_with(END_TAG) {
        full.push('\n');
        full.push_str(END_TAG);
    }
    full
}

fn client(ctx: &ToolContext) -> PlantUmlClient {
    PlantUmlClient::new(
        ctx.settings.plantuml_server_url.clone(),
        ctx.settings.plantuml_timeout(),
    )
}

/// Check the tags, then let the server preprocess the diagram.
///
/// Only a reported syntax error fails; an unreachable server does not.
async fn validate_uml(ctx: &ToolContext, content: &str) -> Result<(), ToolError> {
    if !content.starts_with(START_TAG) || !content.trim_end().ends_with(END_TAG) {
        return Err(ToolError::Other(
            "UML diagram must start with '@startuml' and end with '@enduml'.".to_string(),
        ));
    }

    let report = match client(ctx).render_text(content, ExportFormat::Preproc).await {
        Ok(text) => text,
        Err(ToolError::Http(body)) => body,
        Err(e) => {
            warn!(error = %e, "Skipping server-side diagram validation");
            return Ok(());
        },
    };
    if report.contains("Syntax Error") {
        return Err(ToolError::Other(report));
    }
    Ok(())
}

async fn save(path: &Path, content: &str, overwrite: bool) -> ToolResult {
    if !overwrite && tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ToolError::Other(format!(
            "File {} already exists.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    debug!(path = %path.display(), bytes = content.len(), "Saved diagram");
    Ok(path.display().to_string())
}

async fn load(path: &Path) -> ToolResult {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ToolError::PathNotFound(path.display().to_string()));
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Default location for a named diagram.
fn default_diagram_path(ctx: &ToolContext, name: &str) -> Result<PathBuf, ToolError> {
    let path = ctx.layout.diagrams_dir().join(format!("{name}.puml"));
    ctx.resolve_inside(&path.to_string_lossy())
}

/// Validate a new diagram and save it without overwriting.
pub struct CreateUmlDiagramTool;

#[async_trait::async_trait]
impl BuiltinTool for CreateUmlDiagramTool {
    fn name(&self) -> &'static str {
        "create_uml_diagram"
    }

    fn description(&self) -> &'static str {
        "Draws a UML diagram and saves it. Missing @startuml/@enduml tags are added \
         and the diagram is checked for syntax errors first. Without a path the \
         diagram goes to the diagrams directory as <name>.puml. Returns the saved path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name/title of the diagram"
                },
                "diagram_content": {
                    "type": "string",
                    "description": "PlantUML diagram content"
                },
                "path": {
                    "type": "string",
                    "description": "Where to save the diagram (optional)"
                }
            },
            "required": ["name", "diagram_content"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let name = required_str(&args, "name")?;
        let content = required_str(&args, "diagram_content")?;
        let path = match optional_str(&args, "path") {
            Some(raw) => ctx.resolve_inside(raw)?,
            None => default_diagram_path(ctx, name)?,
        };

        let full = ensure_uml_tags(content, name);
        validate_uml(ctx, &full).await?;
        save(&path, &full, false).await
    }
}

/// Validate replacement content for an existing diagram and overwrite it.
pub struct UpdateUmlTool;

#[async_trait::async_trait]
impl BuiltinTool for UpdateUmlTool {
    fn name(&self) -> &'static str {
        "update_uml"
    }

    fn description(&self) -> &'static str {
        "Replaces the content of an existing UML diagram after checking it for syntax errors."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "uml_content": {
                    "type": "string",
                    "description": "The new diagram content, including @startuml/@enduml"
                },
                "file_path": {
                    "type": "string",
                    "description": "Path to the diagram file"
                }
            },
            "required": ["uml_content", "file_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let content = required_str(&args, "uml_content")?;
        let path = ctx.resolve_inside(required_str(&args, "file_path")?)?;

        validate_uml(ctx, content).await?;
        save(&path, content, true).await
    }
}

/// Save diagram text as-is.
pub struct SaveUmlTool;

#[async_trait::async_trait]
impl BuiltinTool for SaveUmlTool {
    fn name(&self) -> &'static str {
        "save_uml"
    }

    fn description(&self) -> &'static str {
        "Saves UML diagram text to a file. Refuses to replace an existing file unless overwrite is set."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "uml_description": {
                    "type": "string",
                    "description": "The complete diagram content"
                },
                "file_path": {
                    "type": "string",
                    "description": "Where to save the diagram"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace an existing file (default: false)"
                }
            },
            "required": ["uml_description", "file_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let content = required_str(&args, "uml_description")?;
        let path = ctx.resolve_inside(required_str(&args, "file_path")?)?;
        save(&path, content, flag(&args, "overwrite")).await
    }
}

/// Read a diagram back.
pub struct LoadUmlTool;

#[async_trait::async_trait]
impl BuiltinTool for LoadUmlTool {
    fn name(&self) -> &'static str {
        "load_uml"
    }

    fn description(&self) -> &'static str {
        "Loads a UML diagram from a file and returns its content."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the diagram file"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = ctx.resolve_inside(required_str(&args, "file_path")?)?;
        load(&path).await
    }
}

/// Render a saved diagram through the PlantUML server.
pub struct ExportUmlTool;

#[async_trait::async_trait]
impl BuiltinTool for ExportUmlTool {
    fn name(&self) -> &'static str {
        "export_uml"
    }

    fn description(&self) -> &'static str {
        "Exports a UML diagram file to png, svg or txt using the PlantUML server. \
         With output_path the result is written there and the path returned; \
         otherwise the rendered text is returned (svg and txt only)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the diagram file"
                },
                "format_type": {
                    "type": "string",
                    "enum": ["png", "svg", "txt"],
                    "description": "Export format"
                },
                "output_path": {
                    "type": "string",
                    "description": "Where to write the exported diagram (optional)"
                }
            },
            "required": ["file_path", "format_type"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = ctx.resolve_inside(required_str(&args, "file_path")?)?;
        let format: ExportFormat = required_str(&args, "format_type")?.parse()?;
        let output = optional_str(&args, "output_path")
            .map(|raw| ctx.resolve_inside(raw))
            .transpose()?;

        let content = load(&path).await?;
        let client = client(ctx);

        match output {
            Some(output) => {
                let body = client.render(&content, format).await?;
                if let Some(parent) = output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&output, body).await?;
                Ok(output.display().to_string())
            },
            None if format == ExportFormat::Png => Err(ToolError::InvalidArguments(
                "png export requires output_path".to_string(),
            )),
            None => client.render_text(&content, format).await,
        }
    }
}
