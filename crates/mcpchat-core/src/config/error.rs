//! Configuration errors

use thiserror::Error;

/// Errors that can occur while loading or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variables are unset; listed by name, never by value
    #[error("Missing {context} environment variables: {}. Please ensure they are in your `.env` file.", .variables.join(", "))]
    MissingVariables {
        context: String,
        variables: Vec<String>,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("MCP server not found: {0}")]
    ServerNotFound(String),

    #[error("MCP server already exists: {0}")]
    ServerExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn missing(context: impl Into<String>, variables: Vec<String>) -> Self {
        Self::MissingVariables {
            context: context.into(),
            variables,
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
