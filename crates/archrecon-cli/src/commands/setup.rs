//! Setup command: create the workspace layout.

use archrecon_config::Config;
use archrecon_workspace::DirState;

use crate::config_bridge;
use crate::theme::Theme;

/// Create the workspace root and its directories.
pub(crate) fn run_setup(cfg: &Config) -> anyhow::Result<()> {
    let layout = config_bridge::to_layout(cfg)?;
    let report = layout.setup()?;

    let root = &report.base_workspace;
    match root.status {
        DirState::Created => println!("{}", Theme::success(&root.message)),
        DirState::Exists => println!("{}", Theme::info(&root.message)),
    }
    for dir in &report.created {
        println!("  Created: {}", dir.display());
    }
    for dir in &report.existing {
        println!("  {}", Theme::dimmed(&format!("Exists:  {}", dir.display())));
    }
    println!();

    Ok(())
}
