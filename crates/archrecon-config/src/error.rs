/// Errors from loading, validating or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A TOML file could not be parsed.
    #[error("failed to parse {path}: {source}")]
    ParseError {
        /// File path, or a placeholder for in-memory layers.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A JSON file could not be parsed or produced.
    #[error("invalid JSON in {path}: {source}")]
    JsonError {
        /// File path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("failed to write {path}: {source}")]
    WriteError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A required environment variable is unset.
    #[error("Missing environment variable: {name}")]
    MissingEnvironmentVariable {
        /// Variable name.
        name: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
