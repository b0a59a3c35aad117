//! Flatten a repository into one text artifact: summary, tree and content.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::settings::ToolSettings;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult, optional_str, truncate_output};

/// Patterns left out of every extraction.
const DEFAULT_EXCLUDES: &[&str] = &[
    // VCS and editors
    ".git",
    ".svn",
    ".hg",
    ".idea",
    ".vscode",
    ".DS_Store",
    // Dependencies and build output
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "*.egg-info",
    // Lock files
    "package-lock.json",
    "yarn.lock",
    "poetry.lock",
    "Cargo.lock",
    // Binaries and media
    "*.pyc",
    "*.class",
    "*.jar",
    "*.o",
    "*.so",
    "*.dll",
    "*.dylib",
    "*.exe",
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.ico",
    "*.pdf",
    "*.zip",
    "*.tar.gz",
];

const SEPARATOR: &str = "================================================";

/// Ignore file read alongside `.gitignore`.
const INGEST_IGNORE_FILE: &str = ".gitingestignore";

/// The extracted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionArtifact {
    /// Directory name, file count and token estimate.
    pub summary: String,
    /// Directory tree of the included files.
    pub tree: String,
    /// Every included file, delimited by headers.
    pub content: String,
}

/// What to leave out of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Glob patterns added to the defaults.
    pub exclude: Vec<String>,
    /// Keep files matched by `.gitignore` / `.gitingestignore`.
    pub include_gitignored: bool,
}

impl From<&ToolSettings> for ExtractionOptions {
    fn from(settings: &ToolSettings) -> Self {
        Self {
            max_file_size: settings.max_file_size,
            exclude: settings.exclude.clone(),
            include_gitignored: settings.include_gitignored,
        }
    }
}

fn exclude_set(extra: &[String]) -> Result<GlobSet, ToolError> {
    let mut builder = GlobSetBuilder::new();
    let patterns = DEFAULT_EXCLUDES
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str));
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            ToolError::InvalidArguments(format!("invalid exclude pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ToolError::InvalidArguments(format!("failed to compile exclude patterns: {e}")))
}

/// Relative path with `/` separators.
fn display_rel(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Walk `root` and build the artifact.
///
/// Blocking; run it off the async executor.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or an exclude pattern is
/// invalid. Unreadable, oversized and non-UTF-8 files are skipped.
pub fn ingest(root: &Path, options: &ExtractionOptions) -> Result<ExtractionArtifact, ToolError> {
    if !root.is_dir() {
        return Err(ToolError::PathNotFound(root.display().to_string()));
    }
    let excludes = exclude_set(&options.exclude)?;
    let name = root
        .file_name()
        .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(false)
        .follow_links(false)
        .parents(false)
        .git_global(false)
        .git_exclude(!options.include_gitignored)
        .git_ignore(!options.include_gitignored)
        .ignore(false)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if !options.include_gitignored {
        walker.add_custom_ignore_filename(INGEST_IGNORE_FILE);
    }

    let prune_root = root.to_path_buf();
    walker.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let rel = entry.path().strip_prefix(&prune_root).unwrap_or(entry.path());
        !(excludes.is_match(entry.file_name()) || excludes.is_match(rel))
    });

    let mut files: Vec<(String, String)> = Vec::new();
    for entry in walker.build() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
        if size > options.max_file_size {
            debug!(path = %path.display(), size, "Skipping oversized file");
            continue;
        }
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let Ok(text) = String::from_utf8(bytes) else {
            debug!(path = %path.display(), "Skipping non-UTF-8 file");
            continue;
        };
        let rel = path.strip_prefix(root).unwrap_or(path);
        files.push((display_rel(rel), text));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let tree = render_tree(&name, files.iter().map(|(rel, _)| rel.as_str()));

    let mut content = String::new();
    for (rel, text) in &files {
        let _ = write!(content, "{SEPARATOR}\nFILE: {rel}\n{SEPARATOR}\n{text}\n\n");
    }

    let chars = tree.chars().count().saturating_add(content.chars().count());
    let summary = format!(
        "Directory: {name}\nFiles analyzed: {}\n\nEstimated tokens: {}",
        files.len(),
        format_tokens(chars.checked_div(4).unwrap_or(0))
    );

    info!(root = %root.display(), files = files.len(), "Extracted repository");
    Ok(ExtractionArtifact {
        summary,
        tree,
        content,
    })
}

/// `1234` -> `1.2k`, `2500000` -> `2.5M`.
fn format_tokens(tokens: usize) -> String {
    let scaled = |unit: usize, suffix: &str| {
        let whole = tokens.checked_div(unit).unwrap_or(0);
        let tenths = tokens
            .checked_rem(unit)
            .and_then(|r| r.checked_div(unit.checked_div(10).unwrap_or(1)))
            .unwrap_or(0);
        format!("{whole}.{tenths}{suffix}")
    };
    if tokens >= 1_000_000 {
        scaled(1_000_000, "M")
    } else if tokens >= 1_000 {
        scaled(1_000, "k")
    } else {
        tokens.to_string()
    }
}

#[derive(Default)]
struct TreeNode {
    files: Vec<String>,
    dirs: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert(&mut self, rel: &str) {
        match rel.split_once('/') {
            Some((dir, rest)) => self.dirs.entry(dir.to_string()).or_default().insert(rest),
            None => self.files.push(rel.to_string()),
        }
    }

    fn render(&self, prefix: &str, out: &mut String) {
        let mut children: Vec<(String, Option<&TreeNode>)> = Vec::new();
        let mut files = self.files.clone();
        files.sort();
        children.extend(files.into_iter().map(|f| (f, None)));
        children.extend(self.dirs.iter().map(|(d, node)| (format!("{d}/"), Some(node))));

        let last = children.len().saturating_sub(1);
        for (i, (label, node)) in children.into_iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let _ = writeln!(out, "{prefix}{branch}{label}");
            if let Some(node) = node {
                node.render(&format!("{prefix}{indent}"), out);
            }
        }
    }
}

/// Render sorted relative paths as a tree, files before directories.
fn render_tree<'a>(name: &str, paths: impl Iterator<Item = &'a str>) -> String {
    let mut root = TreeNode::default();
    for rel in paths {
        root.insert(rel);
    }
    let mut out = format!("Directory structure:\n└── {name}/\n");
    root.render("    ", &mut out);
    out
}

/// Extract a repository and persist the artifact as JSON.
pub struct ExtractRepositoryTool;

#[async_trait::async_trait]
impl BuiltinTool for ExtractRepositoryTool {
    fn name(&self) -> &'static str {
        "extract_repository_details"
    }

    fn description(&self) -> &'static str {
        "Extracts a repository into a summary, a directory tree and the content of every \
         text file, and saves it as JSON (default temp/repositories/<name>.json). \
         Returns the summary and the saved path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_path": {
                    "type": "string",
                    "description": "Repository directory (default: current location)"
                },
                "output_path": {
                    "type": "string",
                    "description": "Where to save the JSON artifact (optional)"
                },
                "exclude_patterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Extra glob patterns to leave out"
                },
                "include_gitignored": {
                    "type": "boolean",
                    "description": "Keep files matched by .gitignore/.gitingestignore"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let root = match optional_str(&args, "repo_path") {
            Some(raw) => ctx.resolve_inside(raw)?,
            None => ctx.workspace.current(),
        };

        let mut options = ExtractionOptions::from(ctx.settings.as_ref());
        if let Some(patterns) = args.get("exclude_patterns").and_then(Value::as_array) {
            options
                .exclude
                .extend(patterns.iter().filter_map(Value::as_str).map(str::to_string));
        }
        if let Some(include) = args.get("include_gitignored").and_then(Value::as_bool) {
            options.include_gitignored = include;
        }

        let output = match optional_str(&args, "output_path") {
            Some(raw) => ctx.resolve_inside(raw)?,
            None => default_artifact_path(ctx, &root)?,
        };

        let walk_root = root.clone();
        let artifact = tokio::task::spawn_blocking(move || ingest(&walk_root, &options))
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("extraction task failed: {e}")))??;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json =
            serde_json::to_string_pretty(&artifact).map_err(|e| ToolError::Other(e.to_string()))?;
        tokio::fs::write(&output, json).await?;

        Ok(format!(
            "{}\n\nSaved extraction to {}",
            artifact.summary,
            output.display()
        ))
    }
}

fn default_artifact_path(ctx: &ToolContext, repo: &Path) -> Result<PathBuf, ToolError> {
    let name = repo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ToolError::InvalidArguments("repository path has no name".into()))?;
    Ok(ctx.layout.temp_repositories_dir().join(format!("{name}.json")))
}

/// Read back a persisted extraction.
pub struct LoadExtractedRepositoryTool;

#[async_trait::async_trait]
impl BuiltinTool for LoadExtractedRepositoryTool {
    fn name(&self) -> &'static str {
        "load_extracted_repository"
    }

    fn description(&self) -> &'static str {
        "Loads a saved repository extraction, by repository name or by path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": {
                    "type": "string",
                    "description": "Name used when extracting (temp/repositories/<name>.json)"
                },
                "path": {
                    "type": "string",
                    "description": "Path to the JSON artifact"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = match (optional_str(&args, "path"), optional_str(&args, "repo_name")) {
            (Some(raw), _) => ctx.resolve_inside(raw)?,
            (None, Some(name)) => {
                let path = ctx.layout.temp_repositories_dir().join(format!("{name}.json"));
                ctx.resolve_inside(&path.to_string_lossy())?
            },
            (None, None) => {
                return Err(ToolError::InvalidArguments(
                    "repo_name or path is required".into(),
                ));
            },
        };

        if !path.exists() {
            return Err(ToolError::PathNotFound(path.display().to_string()));
        }
        let raw = tokio::fs::read_to_string(&path).await?;
        let artifact: ExtractionArtifact = serde_json::from_str(&raw).map_err(|e| {
            ToolError::ExecutionFailed(format!("invalid extraction at {}: {e}", path.display()))
        })?;
        Ok(truncate_output(format!(
            "{}\n\n{}\n{}",
            artifact.summary, artifact.tree, artifact.content
        )))
    }
}
