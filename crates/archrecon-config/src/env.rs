//! Environment variable fallbacks and ALL-CAPS token resolution.
//!
//! Env vars are **fallback**, not override: they only fill fields no config
//! file set. MCP server configs are different, their ALL-CAPS tokens are
//! substituted unconditionally and an unset variable is fatal.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Workspace root fallback.
pub const WORKSPACE_ROOT_ENV: &str = "AGENT_WORKSPACE_BASE_PATH";
/// PlantUML server URL fallback.
pub const PLANTUML_SERVER_ENV: &str = "PLANTUML_SERVER_URL";
/// Log level fallback.
pub const LOG_ENV: &str = "ARCHRECON_LOG";

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: WORKSPACE_ROOT_ENV,
        field_path: "workspace.root",
    },
    EnvMapping {
        var_name: PLANTUML_SERVER_ENV,
        field_path: "plantuml.server_url",
    },
    EnvMapping {
        var_name: LOG_ENV,
        field_path: "logging.level",
    },
];

/// Word-bounded run of `[A-Z0-9_]`. Callers drop matches without a letter.
#[allow(clippy::expect_used)] // literal pattern
static ENV_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z0-9_]+\b").expect("invalid regex"));

/// Apply environment variable fallbacks to fields that no config file set.
///
/// Fields that only carry an embedded default still take the env value.
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if val.trim().is_empty() {
            continue;
        }

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        if set_field(merged, mapping.field_path, toml::Value::String(val.clone())) {
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a dotted field in a TOML table tree, creating intermediate tables.
///
/// Returns `false` if a non-table value sits on the path.
fn set_field(root: &mut toml::Value, path: &str, val: toml::Value) -> bool {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = root;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        current = table
            .entry(segment)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    match current.as_table_mut() {
        Some(table) => {
            table.insert(leaf.to_owned(), val);
            true
        },
        None => false,
    }
}

/// ALL-CAPS tokens in `input` that look like environment variable names.
pub fn find_env_tokens(input: &str) -> impl Iterator<Item = regex::Match<'_>> {
    ENV_TOKEN
        .find_iter(input)
        .filter(|m| m.as_str().chars().any(|c| c.is_ascii_uppercase()))
}

/// Check whether `input` mentions an environment variable by name.
#[must_use]
pub fn contains_env_token(input: &str) -> bool {
    find_env_tokens(input).next().is_some()
}

/// Replace every env-style token inside the strings of `config` with its
/// value from `env_vars`. Keys are left alone.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvironmentVariable`] for the first token
/// with no matching variable. `config` may be partially resolved by then.
pub fn resolve_environment<S: ::std::hash::BuildHasher>(
    config: &mut serde_json::Value,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<()> {
    match config {
        serde_json::Value::String(s) => {
            *s = substitute_tokens(s, env_vars)?;
        },
        serde_json::Value::Object(map) => {
            for child in map.values_mut() {
                resolve_environment(child, env_vars)?;
            }
        },
        serde_json::Value::Array(items) => {
            for child in items.iter_mut() {
                resolve_environment(child, env_vars)?;
            }
        },
        _ => {},
    }
    Ok(())
}

fn substitute_tokens<S: ::std::hash::BuildHasher>(
    input: &str,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for token in find_env_tokens(input) {
        let name = token.as_str();
        let value = env_vars
            .get(name)
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                name: name.to_owned(),
            })?;
        out.push_str(input.get(last..token.start()).unwrap_or_default());
        out.push_str(value);
        last = token.end();
    }
    out.push_str(input.get(last..).unwrap_or_default());
    Ok(out)
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks_fills_unset_root() {
        let mut merged: toml::Value = toml::from_str("[workspace]\n").unwrap();
        let mut sources = FieldSources::new();
        let env = make_env(&[(WORKSPACE_ROOT_ENV, "/srv/agent")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);
        assert_eq!(count, 1);
        assert_eq!(merged["workspace"]["root"].as_str(), Some("/srv/agent"));
        assert_eq!(
            sources.get("workspace.root"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_fallback_overrides_defaults_only() {
        let mut merged: toml::Value =
            toml::from_str("[plantuml]\nserver_url = \"http://file:1\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("plantuml.server_url".to_owned(), ConfigLayer::File);
        let env = make_env(&[(PLANTUML_SERVER_ENV, "http://env:2")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(
            merged["plantuml"]["server_url"].as_str(),
            Some("http://file:1")
        );

        sources.insert("plantuml.server_url".to_owned(), ConfigLayer::Defaults);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 1);
        assert_eq!(
            merged["plantuml"]["server_url"].as_str(),
            Some("http://env:2")
        );
    }

    #[test]
    fn test_env_fallback_creates_missing_section() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[(LOG_ENV, "debug")]);

        apply_env_fallbacks(&mut merged, &mut sources, &env);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
    }

    #[test]
    fn test_env_token_detection() {
        assert!(contains_env_token("API_KEY_ENV"));
        assert!(contains_env_token("Bearer GITHUB_TOKEN"));
        assert!(!contains_env_token("sk-12345"));
        assert!(!contains_env_token("8080"));
        assert!(!contains_env_token("Bearer abc"));
    }

    #[test]
    fn test_resolve_environment_replaces_tokens() {
        let mut config = json!({
            "github": {
                "command": "npx",
                "args": ["-y", "server-github"],
                "env": {"GITHUB_TOKEN": "GH_PAT"},
                "headers": {"Authorization": "Bearer GH_PAT"}
            }
        });
        let env = make_env(&[("GH_PAT", "ghp_x")]);

        resolve_environment(&mut config, &env).unwrap();
        assert_eq!(config["github"]["env"]["GITHUB_TOKEN"], "ghp_x");
        assert_eq!(config["github"]["headers"]["Authorization"], "Bearer ghp_x");
        assert_eq!(config["github"]["command"], "npx");
    }

    #[test]
    fn test_resolve_environment_missing_variable() {
        let mut config = json!({"token": "NOT_SET_ANYWHERE"});
        let err = resolve_environment(&mut config, &make_env(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: NOT_SET_ANYWHERE"
        );
    }
}
