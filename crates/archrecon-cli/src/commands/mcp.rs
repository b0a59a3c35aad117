//! MCP server configuration commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use archrecon_config::{Config, ConfigSanitizer, SaveStatus, load_mcp_config, save_mcp_config};
use serde_json::Value;

use crate::theme::Theme;

/// The configured MCP file, relative paths taken from `cwd`.
pub(crate) fn config_path(cfg: &Config, cwd: &Path) -> PathBuf {
    let path = Path::new(&cfg.mcp.config_file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Print the MCP config with secrets redacted.
pub(crate) fn show(cfg: &Config, cwd: &Path) -> anyhow::Result<()> {
    let path = config_path(cfg, cwd);
    let raw = load_mcp_config(&path)?;

    let mut sanitizer = ConfigSanitizer::new();
    let redacted = sanitizer.sanitize(&raw);

    println!("{}", Theme::dimmed(&format!("# {}", path.display())));
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    let leaks = sanitizer.unique_leaks();
    if !leaks.is_empty() {
        eprintln!(
            "{}",
            Theme::warning(&format!("Secret values stored at: {}", leaks.join(", ")))
        );
    }
    Ok(())
}

/// Redact and save `json` as the MCP config, then print the report.
pub(crate) fn save(cfg: &Config, cwd: &Path, json: &str) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(json).context("--json is not valid JSON")?;
    let report = save_mcp_config(&value, &config_path(cfg, cwd))?;

    match report.status {
        SaveStatus::Success => println!("{}", Theme::success(&report.message)),
        SaveStatus::Warning => println!("{}", Theme::warning(&report.message)),
    }
    Ok(())
}
