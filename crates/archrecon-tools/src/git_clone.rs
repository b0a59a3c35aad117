//! Clone a git repository into `repositories/`.

use archrecon_workspace::{RepositoryIndex, RepositoryWorkspaceEntry, WorkspaceError, normalize_from};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, flag, optional_str, required_str};

/// Outcome of a clone, returned to the agent as JSON.
///
/// Git failures are reported here with `success: false` rather than as a
/// tool error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneReport {
    /// Whether the checkout exists now.
    pub success: bool,
    /// Checkout location, or the requested name when git failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Checked-out branch, `"detached"` for a detached HEAD.
    #[serde(default)]
    pub branch: Option<String>,
    /// Failure description.
    #[serde(default)]
    pub error: Option<String>,
}

impl CloneReport {
    fn failed(dest: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            dest,
            branch: None,
            error: Some(error.into()),
        }
    }

    fn to_json(&self) -> ToolResult {
        serde_json::to_string(self).map_err(|e| ToolError::Other(e.to_string()))
    }
}

/// Clone a repository into the workspace.
pub struct GitCloneTool;

#[async_trait::async_trait]
impl BuiltinTool for GitCloneTool {
    fn name(&self) -> &'static str {
        "git_clone"
    }

    fn description(&self) -> &'static str {
        "Clones a git repository into repositories/<dest>. With a branch the checkout \
         goes to repositories/<dest>/<branch>. Returns JSON with success, dest, branch and error."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_url": {
                    "type": "string",
                    "description": "HTTPS or SSH URL of the repository"
                },
                "dest": {
                    "type": "string",
                    "description": "Destination folder name inside repositories/"
                },
                "branch": {
                    "type": "string",
                    "description": "Branch to check out (optional)"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace an existing destination (default: false)"
                }
            },
            "required": ["repo_url", "dest"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let repo_url = required_str(&args, "repo_url")?;
        let dest = required_str(&args, "dest")?;
        let branch = optional_str(&args, "branch");
        let overwrite = flag(&args, "overwrite");

        let mut full_dest = ctx.workspace.resolve_repository_path(dest);
        if !ctx.workspace.contains(&full_dest) || full_dest == ctx.layout.repositories_dir() {
            return Err(WorkspaceError::OutsideWorkspace { path: full_dest }.into());
        }

        if full_dest.exists() {
            if !overwrite {
                return CloneReport::failed(
                    None,
                    format!("Destination {} already exists.", full_dest.display()),
                )
                .to_json();
            }
            remove_existing(&full_dest).await?;
        }

        let mut entry_name = dest.to_string();
        if let Some(branch) = branch {
            full_dest = normalize_from(branch, &full_dest);
            if !ctx.workspace.contains(&full_dest) {
                return Err(WorkspaceError::OutsideWorkspace { path: full_dest }.into());
            }
            entry_name = format!("{dest}/{branch}");
        }
        if let Some(parent) = full_dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let git = &ctx.settings.git_command;
        let mut cmd = Command::new(git);
        cmd.arg("clone");
        if let Some(branch) = branch {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(repo_url).arg(&full_dest);
        cmd.stdin(Stdio::null());

        info!(url = %repo_url, dest = %full_dest.display(), branch = ?branch, "Cloning repository");
        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                return CloneReport::failed(Some(dest.to_string()), format!("Failed to run {git}: {e}"))
                    .to_json();
            },
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(url = %repo_url, error = %stderr, "git clone failed");
            return CloneReport::failed(Some(dest.to_string()), stderr).to_json();
        }

        let checked_out = current_branch(git, &full_dest).await;
        record_clone(ctx, &entry_name, &full_dest, repo_url, branch);

        CloneReport {
            success: true,
            dest: Some(full_dest.display().to_string()),
            branch: Some(checked_out),
            error: None,
        }
        .to_json()
    }
}

async fn remove_existing(path: &Path) -> Result<(), ToolError> {
    debug!(path = %path.display(), "Removing existing destination");
    if path.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

/// Short name of the checked-out branch, or `"detached"`.
async fn current_branch(git: &str, checkout: &Path) -> String {
    let output = Command::new(git)
        .arg("-C")
        .arg(checkout)
        .args(["symbolic-ref", "--short", "-q", "HEAD"])
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if name.is_empty() {
                "detached".to_string()
            } else {
                name
            }
        },
        _ => "detached".to_string(),
    }
}

fn record_clone(ctx: &ToolContext, name: &str, checkout: &Path, url: &str, branch: Option<&str>) {
    let index_file = ctx.layout.index_file();
    let result = RepositoryIndex::load(&index_file).and_then(|mut index| {
        let mut entry = RepositoryWorkspaceEntry::new(name, checkout, url);
        if let Some(branch) = branch {
            entry = entry.with_branch(branch);
        }
        index.upsert(entry);
        index.save(&index_file)
    });
    if let Err(e) = result {
        warn!(error = %e, "Failed to record cloned repository");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_existing_destination_without_overwrite() {
        let (_dir, ctx) = test_support::workspace();
        let existing = ctx.layout.repositories_dir().join("app");
        std::fs::create_dir_all(&existing).unwrap();

        let out = GitCloneTool
            .execute(json!({"repo_url": "https://example.invalid/app.git", "dest": "app"}), &ctx)
            .await
            .unwrap();
        let report: CloneReport = serde_json::from_str(&out).unwrap();

        assert!(!report.success);
        assert_eq!(
            report.error.unwrap(),
            format!("Destination {} already exists.", existing.display())
        );
        assert!(existing.exists());
    }

    #[tokio::test]
    async fn test_destination_escape_rejected() {
        let (_dir, ctx) = test_support::workspace();
        let err = GitCloneTool
            .execute(json!({"repo_url": "https://example.invalid/x.git", "dest": "../../.."}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("outside the allowed workspace"));
    }

    #[tokio::test]
    async fn test_missing_git_binary_reports_failure() {
        let (_dir, ctx) = test_support::workspace();
        let mut settings = (*ctx.settings).clone();
        settings.git_command = "archrecon-no-such-git".to_string();
        let ctx = ToolContext::new(ctx.workspace, settings);

        let out = GitCloneTool
            .execute(json!({"repo_url": "https://example.invalid/app.git", "dest": "app"}), &ctx)
            .await
            .unwrap();
        let report: CloneReport = serde_json::from_str(&out).unwrap();

        assert!(!report.success);
        assert_eq!(report.dest.as_deref(), Some("app"));
        assert!(report.error.unwrap().starts_with("Failed to run archrecon-no-such-git"));
        assert!(RepositoryIndex::load(&ctx.layout.index_file()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_removes_existing_destination() {
        let (_dir, ctx) = test_support::workspace();
        let existing = ctx.layout.repositories_dir().join("app");
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("stale.txt"), "old").unwrap();

        let mut settings = (*ctx.settings).clone();
        settings.git_command = "archrecon-no-such-git".to_string();
        let ctx = ToolContext::new(ctx.workspace, settings);

        let args = json!({
            "repo_url": "https://example.invalid/app.git",
            "dest": "app",
            "overwrite": true
        });
        let out = GitCloneTool.execute(args, &ctx).await.unwrap();
        let report: CloneReport = serde_json::from_str(&out).unwrap();

        assert!(!report.success);
        assert!(!existing.join("stale.txt").exists());
    }
}
