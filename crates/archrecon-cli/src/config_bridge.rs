//! Bridge from `archrecon_config::Config` to the types the tools, the
//! approval gate and logging are built from.

use std::path::Path;

use archrecon_approval::{InterruptPolicy, InterruptRegistry, InterruptSetting};
use archrecon_config::{Config, ConfigResult};
use archrecon_telemetry::{LogConfig, LogFormat};
use archrecon_tools::{ToolContext, ToolSettings};
use archrecon_workspace::{WorkspaceContext, WorkspaceLayout, WorkspaceRoot};

/// Tool settings from the `plantuml`, `diagrams` and `extraction` sections.
#[must_use]
pub(crate) fn to_tool_settings(cfg: &Config) -> ToolSettings {
    ToolSettings {
        plantuml_server_url: cfg.plantuml.server_url.clone(),
        plantuml_timeout_secs: cfg.plantuml.timeout_secs,
        diagrams_dir: cfg.diagrams.directory.clone(),
        max_file_size: cfg.extraction.max_file_size,
        exclude: cfg.extraction.exclude.clone(),
        include_gitignored: cfg.extraction.include_gitignored,
        ..ToolSettings::default()
    }
}

/// Logging setup. With `to_file`, logs go to `logs_dir` when one is given.
#[must_use]
pub(crate) fn to_log_config(cfg: &Config, logs_dir: Option<&Path>) -> LogConfig {
    let format = cfg.logging.format.parse::<LogFormat>().unwrap_or_default();
    let mut log = LogConfig::new(&cfg.logging.level).with_format(format);
    for directive in &cfg.logging.directives {
        log = log.with_directive(directive);
    }
    match logs_dir {
        Some(dir) if cfg.logging.to_file => log.with_file_logging(dir),
        _ => log,
    }
}

/// Map a policy name onto an interrupt setting.
///
/// Unknown names fall back to the default policy.
#[must_use]
pub(crate) fn policy_setting(name: &str) -> InterruptSetting {
    match name.to_ascii_lowercase().as_str() {
        "permissive" => InterruptSetting::Enabled,
        "unrestricted" => InterruptSetting::Custom(InterruptPolicy::unrestricted()),
        _ => InterruptSetting::Default,
    }
}

/// Interrupt registry for the tools named in the `approval` section.
///
/// Empty when approval is disabled.
#[must_use]
pub(crate) fn to_interrupts(cfg: &Config) -> InterruptRegistry {
    let mut interrupts = InterruptRegistry::new();
    if cfg.approval.enabled {
        interrupts.apply_or_default(
            cfg.approval.tools.iter().map(String::as_str),
            policy_setting(&cfg.approval.policy),
            true,
        );
    }
    interrupts
}

/// Layout of the configured workspace.
///
/// # Errors
///
/// Returns an error if no workspace root is configured.
pub(crate) fn to_layout(cfg: &Config) -> ConfigResult<WorkspaceLayout> {
    let root = WorkspaceRoot::new(cfg.workspace_root()?);
    Ok(WorkspaceLayout::new(root.path()).with_diagrams_dir(&cfg.diagrams.directory))
}

/// Tool context rooted at the configured workspace.
///
/// # Errors
///
/// Returns an error if no workspace root is configured.
pub(crate) fn to_tool_context(cfg: &Config) -> ConfigResult<ToolContext> {
    let root = WorkspaceRoot::new(cfg.workspace_root()?);
    Ok(ToolContext::new(
        WorkspaceContext::new(root),
        to_tool_settings(cfg),
    ))
}
