//! Tool session trait definition

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{ToolDescriptor, ToolOutcome};
use super::error::SessionResult;

/// One live connection to a tool provider
///
/// A session is not assumed to be reentrant: the dispatcher never issues two
/// concurrent calls against the same session.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Short label for the transport behind this session (e.g. "mcp", "postgres")
    fn kind(&self) -> &str;

    /// List the tools this provider exposes
    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>>;

    /// Invoke a tool with a JSON object payload
    async fn call_tool(&self, name: &str, arguments: Value) -> SessionResult<ToolOutcome>;
}
