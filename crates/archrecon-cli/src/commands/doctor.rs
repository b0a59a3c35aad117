//! Doctor command for health checks.

use std::path::Path;

use archrecon_config::ResolvedConfig;
use archrecon_tools::plantuml::PlantUmlClient;
use colored::Colorize;

use crate::commands::mcp;
use crate::config_bridge;
use crate::theme::Theme;

/// Check the workspace, external commands and the PlantUML server.
pub(crate) async fn run_doctor(resolved: &ResolvedConfig, cwd: &Path) -> anyhow::Result<()> {
    let cfg = &resolved.config;
    println!("{}", "archrecon doctor".cyan().bold());
    println!();

    // Configuration
    print!("  Configuration... ");
    if resolved.loaded_files.is_empty() {
        println!("{} (defaults and environment only)", "OK".green());
    } else {
        println!("{}", "OK".green());
        for file in &resolved.loaded_files {
            println!("    Loaded: {file}");
        }
    }

    let mut healthy = true;

    // Workspace
    print!("  Workspace root... ");
    match config_bridge::to_layout(cfg) {
        Ok(layout) => {
            let missing: Vec<_> = layout
                .required_dirs()
                .into_iter()
                .filter(|dir| !dir.is_dir())
                .collect();
            if !layout.root().is_dir() {
                println!("{} ({} does not exist)", "WARN".yellow(), layout.root().display());
                println!("    Run `archrecon setup` to create it");
            } else if missing.is_empty() {
                println!("{} ({})", "OK".green(), layout.root().display());
            } else {
                println!("{} ({} directories missing)", "WARN".yellow(), missing.len());
                for dir in missing {
                    println!("    {}", Theme::dimmed(&dir.display().to_string()));
                }
                println!("    Run `archrecon setup` to create them");
            }
        },
        Err(e) => {
            healthy = false;
            println!("{}", Theme::status(false));
            println!("    {e}");
        },
    }

    // External commands
    let settings = config_bridge::to_tool_settings(cfg);
    for (label, command, required) in [
        ("git", settings.git_command.as_str(), true),
        ("archlens", settings.archlens_command.as_str(), false),
    ] {
        print!("  {label}... ");
        match which::which(command) {
            Ok(path) => println!("{} ({})", "OK".green(), path.display()),
            Err(_) if required => {
                healthy = false;
                println!("{} ({command} not found on PATH)", Theme::status(false));
            },
            Err(_) => println!("{} ({command} not found on PATH)", "WARN".yellow()),
        }
    }

    // PlantUML
    print!("  PlantUML server... ");
    let client = PlantUmlClient::new(&settings.plantuml_server_url, settings.plantuml_timeout());
    if client.is_available().await {
        println!("{} ({})", "OK".green(), settings.plantuml_server_url);
    } else {
        healthy = false;
        println!("{} ({} unreachable)", Theme::status(false), settings.plantuml_server_url);
    }

    // MCP servers
    print!("  MCP server configuration... ");
    let path = mcp::config_path(cfg, cwd);
    if path.is_file() {
        println!("{} ({})", "OK".green(), path.display());
    } else {
        println!("{} (no config file)", "OK".dimmed());
    }

    println!();
    if healthy {
        println!("{}", "archrecon is ready to use!".green().bold());
    } else {
        println!(
            "{}",
            "Please address the issues above before using archrecon."
                .yellow()
                .bold()
        );
    }

    Ok(())
}
