//! Deep merge of TOML values with per-field source tracking.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from the file never overrides a default.

use std::collections::HashMap;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// `archrecon.toml` or the file given with `--config`.
    File,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File => write!(f, "file"),
            Self::Environment => write!(f, "env"),
        }
    }
}

/// Dotted field path → which layer set the value.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Deep-merge `overlay` into `base`, recording `layer` for every leaf the
/// overlay touches.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    deep_merge(base, overlay);
    record_leaves(overlay, "", layer, sources);
}

/// Mark every leaf in `val` as set by `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            record_leaves(child, &path, layer, sources);
        }
    } else if !prefix.is_empty() {
        sources.insert(prefix.to_owned(), layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_scalar_replaced_sibling_kept() {
        let mut base = parse("[plantuml]\nserver_url = \"a\"\ntimeout_secs = 20\n");
        deep_merge(&mut base, &parse("[plantuml]\nserver_url = \"b\"\n"));

        assert_eq!(base["plantuml"]["server_url"].as_str(), Some("b"));
        assert_eq!(base["plantuml"]["timeout_secs"].as_integer(), Some(20));
    }

    #[test]
    fn test_arrays_replace_not_append() {
        let mut base = parse("[approval]\ntools = [\"a\", \"b\"]\n");
        deep_merge(&mut base, &parse("[approval]\ntools = [\"c\"]\n"));

        let tools = base["approval"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].as_str(), Some("c"));
    }

    #[test]
    fn test_tracking_records_only_overlay_leaves() {
        let mut base = parse("[logging]\nlevel = \"info\"\nformat = \"compact\"\n");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", ConfigLayer::Defaults, &mut sources);

        let overlay = parse("[logging]\nlevel = \"debug\"\n");
        deep_merge_tracking(&mut base, &overlay, ConfigLayer::File, &mut sources);

        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::File));
        assert_eq!(sources.get("logging.format"), Some(&ConfigLayer::Defaults));
    }
}
