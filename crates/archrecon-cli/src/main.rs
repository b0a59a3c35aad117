//! archrecon CLI
//!
//! Drives the repository, navigation and diagram tools by hand. Reviewed
//! tools stop at the approval gate and ask on the terminal.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};

use anyhow::Result;
use archrecon_config::{Config, ResolvedConfig};
use clap::{Parser, Subcommand};

mod approval_handler;
mod commands;
mod config_bridge;
mod theme;

use commands::{call, config, doctor, mcp, setup, tools};
use theme::print_banner;

/// archrecon - repository reconnaissance and architecture diagrams
#[derive(Parser)]
#[command(name = "archrecon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (default: ./archrecon.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the workspace directories
    Setup,

    /// List the tools and their review policies
    Tools,

    /// Run one tool through the approval gate
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,

        /// Accept every review without prompting
        #[arg(long)]
        auto_approve: bool,
    },

    /// Manage the MCP server configuration
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run health checks
    Doctor,
}

#[derive(Subcommand)]
enum McpCommands {
    /// Print the MCP config with secrets redacted
    Show,

    /// Redact secrets and save a new MCP config
    Save {
        /// The full config as JSON
        #[arg(long)]
        json: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show {
        /// Output format: toml or json
        #[arg(short, long, default_value = "toml")]
        format: String,

        /// Show only this section (e.g. "plantuml")
        #[arg(short, long)]
        section: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    // Configuration errors are fatal.
    let resolved = Config::load(cli.config.as_deref(), &cwd)?;

    let logs_dir = config_bridge::to_layout(&resolved.config)
        .ok()
        .map(|layout| layout.logs_dir());
    let mut log_config = config_bridge::to_log_config(&resolved.config, logs_dir.as_deref());
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = archrecon_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Some(Commands::Setup) => setup::run_setup(&resolved.config)?,
        Some(Commands::Tools) => tools::list_tools(&resolved.config)?,
        Some(Commands::Call {
            tool,
            args,
            auto_approve,
        }) => {
            let ok = call::run_call(&resolved.config, &tool, args.as_deref(), auto_approve).await?;
            if !ok {
                std::process::exit(1);
            }
        },
        Some(Commands::Mcp { command }) => handle_mcp(command, &resolved.config, &cwd)?,
        Some(Commands::Config { command }) => handle_config(command, &resolved)?,
        Some(Commands::Doctor) => doctor::run_doctor(&resolved, &cwd).await?,
        None => {
            print_banner();
            println!("Run `archrecon --help` for usage.");
        },
    }

    Ok(())
}

fn handle_mcp(command: McpCommands, cfg: &Config, cwd: &Path) -> Result<()> {
    match command {
        McpCommands::Show => mcp::show(cfg, cwd),
        McpCommands::Save { json } => mcp::save(cfg, cwd, &json),
    }
}

fn handle_config(command: ConfigCommands, resolved: &ResolvedConfig) -> Result<()> {
    match command {
        ConfigCommands::Show { format, section } => {
            config::show_config(resolved, &format, section.as_deref())
        },
    }
}
