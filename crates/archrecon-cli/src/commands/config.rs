//! Config command: print the resolved configuration.

use archrecon_config::{ResolvedConfig, ShowFormat};

/// Print `resolved` as TOML or JSON, optionally one section only.
pub(crate) fn show_config(
    resolved: &ResolvedConfig,
    format: &str,
    section: Option<&str>,
) -> anyhow::Result<()> {
    let fmt = match format.to_ascii_lowercase().as_str() {
        "toml" => ShowFormat::Toml,
        "json" => ShowFormat::Json,
        other => anyhow::bail!("Unknown format '{other}'. Use 'toml' or 'json'."),
    };

    let output = resolved.show(fmt, section).map_err(|_| match section {
        Some(name) => anyhow::anyhow!("Unknown config section '{name}'"),
        None => anyhow::anyhow!("Failed to render configuration"),
    })?;
    println!("{output}");
    Ok(())
}
