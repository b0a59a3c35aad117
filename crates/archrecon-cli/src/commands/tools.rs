//! Tools command: list the tools and their review policies.

use archrecon_config::Config;
use archrecon_tools::{BuiltinTool, ToolDispatcher, ToolRegistry};

use crate::config_bridge;
use crate::theme::Theme;

/// Print every tool, then the interrupt config map as JSON.
pub(crate) fn list_tools(cfg: &Config) -> anyhow::Result<()> {
    let dispatcher = ToolDispatcher::new(
        ToolRegistry::with_defaults(),
        config_bridge::to_interrupts(cfg),
        config_bridge::to_tool_context(cfg)?,
    );

    println!("{}", Theme::header("Tools"));
    println!("{}", Theme::separator());
    for tool in dispatcher.registry().tools() {
        let reviewed = if dispatcher.interrupts().resolve(tool.name()).is_some() {
            " [review]"
        } else {
            ""
        };
        println!("  {}{}", tool.name(), Theme::dimmed(reviewed));
        println!("    {}", Theme::dimmed(tool.description()));
    }
    println!();

    println!("{}", Theme::header("Interrupt configuration"));
    println!("{}", serde_json::to_string_pretty(&dispatcher.interrupt_map())?);

    Ok(())
}
