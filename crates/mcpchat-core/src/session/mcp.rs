//! Tool session backed by an MCP client

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::McpClient;
use crate::tools::translate::{descriptor_from_mcp, outcome_from_mcp};
use crate::types::{ToolDescriptor, ToolOutcome};

use super::error::SessionResult;
use super::traits::ToolSession;

/// [`ToolSession`] over a connected [`McpClient`]
///
/// Dropping the last handle shuts the underlying MCP service down.
pub struct McpSession {
    client: Arc<McpClient>,
}

impl McpSession {
    pub fn new(client: McpClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Access the underlying client
    pub fn client(&self) -> &McpClient {
        &self.client
    }
}

#[async_trait]
impl ToolSession for McpSession {
    fn kind(&self) -> &str {
        "mcp"
    }

    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        let tools = self.client.list_tools().await?;
        Ok(tools.into_iter().map(descriptor_from_mcp).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> SessionResult<ToolOutcome> {
        let result = self.client.call_tool(name, arguments).await?;
        Ok(outcome_from_mcp(&result))
    }
}
