//! Gateway error types

use mcpchat_core::config::ConfigError;
use thiserror::Error;

/// Errors raised by the query gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Input rejected before any database access
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection settings are missing or unusable
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
