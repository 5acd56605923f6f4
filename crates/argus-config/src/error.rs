//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A watch row is missing a required field or is otherwise unusable.
    #[error("invalid watch entry '{id}': {reason}")]
    InvalidWatch { id: String, reason: String },

    /// API access is configured but the token is not resolvable.
    #[error("API token not found: set the {env_var} environment variable")]
    ApiTokenNotFound { env_var: String },
}
