//! Call command: run one tool through the approval gate.

use anyhow::Context;
use archrecon_approval::{ApprovalHandler, AutoApproveHandler};
use archrecon_config::Config;
use archrecon_tools::{ToolDispatcher, ToolRegistry};
use serde_json::Value;
use tracing::info;

use crate::approval_handler::CliApprovalHandler;
use crate::config_bridge;
use crate::theme::Theme;

/// Parse `--args`; absent means no arguments.
pub(crate) fn parse_args(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        None => Ok(Value::Object(serde_json::Map::new())),
        Some(text) => {
            let value: Value =
                serde_json::from_str(text).context("--args must be a JSON object")?;
            anyhow::ensure!(value.is_object(), "--args must be a JSON object");
            Ok(value)
        },
    }
}

/// Dispatch `tool` and print its output.
///
/// Returns whether the call succeeded.
pub(crate) async fn run_call(
    cfg: &Config,
    tool: &str,
    args: Option<&str>,
    auto_approve: bool,
) -> anyhow::Result<bool> {
    let args = parse_args(args)?;
    let dispatcher = ToolDispatcher::new(
        ToolRegistry::with_defaults(),
        config_bridge::to_interrupts(cfg),
        config_bridge::to_tool_context(cfg)?,
    );
    info!(tool, session = %dispatcher.session_id(), auto_approve, "Calling tool");

    let handler: &dyn ApprovalHandler = if auto_approve {
        &AutoApproveHandler
    } else {
        &CliApprovalHandler
    };
    let output = dispatcher.call(tool, args, handler).await;

    if output.success {
        println!("{}", output.content);
    } else {
        eprintln!("{}", Theme::error(&output.content));
    }
    Ok(output.success)
}
