#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Configuration for archrecon.
//!
//! Two kinds of configuration live here:
//!
//! - the agent's own settings ([`Config`]), layered from TOML;
//! - the MCP server config, an opaque JSON file that is redacted on save and
//!   resolved against the environment on use.
//!
//! # Usage
//!
//! ```rust,no_run
//! use archrecon_config::Config;
//!
//! let resolved = Config::load(None, std::path::Path::new(".")).unwrap();
//! println!("PlantUML at {}", resolved.config.plantuml.server_url);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **File** (`--config <path>`, else `./archrecon.toml`)
//! 2. **Environment variables** (`AGENT_WORKSPACE_BASE_PATH`,
//!    `PLANTUML_SERVER_URL`, `ARCHRECON_LOG`), fallback only
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! This crate depends on no other archrecon crate.

/// Environment variable fallbacks and token resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Secret redaction.
pub mod sanitize;
/// MCP server config load and save.
pub mod servers;
/// Resolved configuration display.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use env::{collect_env_vars, resolve_environment};
pub use error::{ConfigError, ConfigResult};
pub use sanitize::{ConfigSanitizer, REDACTED};
pub use servers::{SaveReport, SaveStatus, load_mcp_config, save_mcp_config};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the final
    /// configuration fails validation.
    pub fn load(
        explicit: Option<&std::path::Path>,
        cwd: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, cwd)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
