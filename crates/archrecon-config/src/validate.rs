//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
/// Output formats accepted by `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];
/// Presets accepted by `approval.policy`.
pub const APPROVAL_POLICIES: &[&str] = &["default", "permissive", "unrestricted"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found. A missing workspace root is
/// reported as [`ConfigError::MissingEnvironmentVariable`].
pub fn validate(config: &Config) -> ConfigResult<()> {
    config.workspace_root()?;
    validate_plantuml(config)?;
    validate_diagrams(config)?;
    validate_extraction(config)?;
    validate_approval(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_plantuml(config: &Config) -> ConfigResult<()> {
    let p = &config.plantuml;

    let url = Url::parse(&p.server_url)
        .map_err(|e| invalid("plantuml.server_url", format!("'{}': {e}", p.server_url)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "plantuml.server_url",
            format!("unsupported scheme '{}'; expected http or https", url.scheme()),
        ));
    }

    if p.timeout_secs == 0 {
        return Err(invalid("plantuml.timeout_secs", "timeout must be positive"));
    }

    Ok(())
}

fn validate_diagrams(config: &Config) -> ConfigResult<()> {
    if config.diagrams.directory.trim().is_empty() {
        return Err(invalid("diagrams.directory", "must not be empty"));
    }
    Ok(())
}

fn validate_extraction(config: &Config) -> ConfigResult<()> {
    if config.extraction.max_file_size == 0 {
        return Err(invalid(
            "extraction.max_file_size",
            "max_file_size must be positive",
        ));
    }
    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    let policy = config.approval.policy.as_str();
    if !APPROVAL_POLICIES.contains(&policy) {
        return Err(invalid(
            "approval.policy",
            format!(
                "unknown policy '{policy}'; expected one of: {}",
                APPROVAL_POLICIES.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    let level = l.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if !LOG_FORMATS.contains(&l.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}
