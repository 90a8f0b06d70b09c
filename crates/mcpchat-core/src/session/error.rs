//! Session error types

use thiserror::Error;

use crate::mcp::McpError;

/// Transport-level failures of a tool session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The connection to the provider failed or was severed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with something that is not a valid response
    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),
}

impl From<McpError> for SessionError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Protocol(msg) => SessionError::MalformedResponse(msg),
            other => SessionError::Transport(other.to_string()),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
