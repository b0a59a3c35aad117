//! Secret redaction for MCP server configs.
//!
//! A value is treated as a leaked secret when its key looks secret-like and
//! the value is not just the name of an environment variable.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::env::contains_env_token;

/// Replacement for redacted values.
pub const REDACTED: &str = "<REDACTED>";

/// Substrings of a lower-cased key that mark it as secret-like.
const SECRET_KEY_TOKENS: &[&str] = &[
    "api_key",
    "apikey",
    "key",
    "secret",
    "token",
    "password",
    "authorization",
];

#[allow(clippy::expect_used)] // literal pattern
static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Bearer\s+)\S+").expect("invalid regex"));

/// Recursively redacts secrets and records where it found them.
#[derive(Debug, Default)]
pub struct ConfigSanitizer {
    leaks: Vec<String>,
}

impl ConfigSanitizer {
    /// Create a sanitizer with no recorded leaks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a redacted copy of `value`.
    ///
    /// A bare top-level string has no key and is returned unchanged.
    pub fn sanitize(&mut self, value: &Value) -> Value {
        self.walk(value, &mut Vec::new())
    }

    /// Dotted paths of every redacted value, in visit order.
    #[must_use]
    pub fn leaks(&self) -> &[String] {
        &self.leaks
    }

    /// Sorted, de-duplicated leak paths.
    #[must_use]
    pub fn unique_leaks(&self) -> Vec<String> {
        let mut unique = self.leaks.clone();
        unique.sort();
        unique.dedup();
        unique
    }

    fn walk(&mut self, value: &Value, path: &mut Vec<String>) -> Value {
        match value {
            Value::Object(map) => self.walk_object(map, path),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(i.to_string());
                    out.push(self.walk(item, path));
                    path.pop();
                }
                Value::Array(out)
            },
            other => other.clone(),
        }
    }

    fn walk_object(&mut self, map: &Map<String, Value>, path: &mut Vec<String>) -> Value {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            path.push(key.clone());
            let sanitized = if is_secret(key, value) {
                self.leaks.push(path.join("."));
                redact(value)
            } else if value.is_object() || value.is_array() {
                self.walk(value, path)
            } else {
                value.clone()
            };
            path.pop();
            out.insert(key.clone(), sanitized);
        }
        Value::Object(out)
    }
}

/// Check whether `key` names a secret-like field.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SECRET_KEY_TOKENS
        .iter()
        .any(|token| lowered.contains(token))
}

fn is_secret(key: &str, value: &Value) -> bool {
    if !is_secret_key(key) {
        return false;
    }
    match value {
        Value::String(s) => !contains_env_token(s),
        _ => true,
    }
}

fn redact(value: &Value) -> Value {
    let replacement = match value {
        Value::String(s) => BEARER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .map_or_else(
                || REDACTED.to_owned(),
                |scheme| format!("{}{REDACTED}", scheme.as_str()),
            ),
        _ => REDACTED.to_owned(),
    };
    Value::String(replacement)
}
