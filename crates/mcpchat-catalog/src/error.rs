//! Catalog error types

use mcpchat_core::config::ConfigError;
use thiserror::Error;

/// Errors raised while talking to the catalog server
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Host or credentials are missing or unusable
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the credentials
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// Errors that no other lookup against the same server would avoid
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatalogError::Configuration(_) | CatalogError::Http(_) | CatalogError::Auth { .. }
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::InvalidResponse(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
