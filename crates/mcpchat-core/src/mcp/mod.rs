//! MCP (Model Context Protocol) client module
//!
//! Uses the official rmcp SDK to connect to MCP servers.
//! Supports stdio child processes, Unix socket and HTTP transports.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcpchat_core::mcp::{McpClient, McpTransport};
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger::new());
//!
//! let transport = McpTransport::stdio("python", vec!["mcp_server.py".into()]);
//! let client = McpClient::connect(&transport, logger).await?;
//!
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("list_tables", json!({"limit": 10})).await?;
//! ```

mod client;

pub use client::{McpClient, McpError, McpResult, McpTransport};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{Tool as McpTool, CallToolResult as McpToolResult};
