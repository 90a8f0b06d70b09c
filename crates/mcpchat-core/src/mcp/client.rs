//! MCP Client using the official rmcp SDK
//!
//! Connects to MCP servers spawned as child processes (stdio), over HTTP, or
//! over a Unix socket.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, Tool},
    service::RunningService,
    transport::TokioChildProcess,
    RoleClient,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::logging::Logger;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

/// How to reach an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpTransport {
    /// Spawn the server and talk to it over stdin/stdout
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Streamable HTTP endpoint
    Http { url: String },
    /// Unix domain socket
    Unix { path: String },
}

impl McpTransport {
    /// Stdio transport for `command args...`
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        McpTransport::Stdio {
            command: command.into(),
            args,
            env: HashMap::new(),
        }
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "mcpchat-core".to_string(),
            title: Some("mcpchat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client for one connected tool provider
pub struct McpClient {
    /// The underlying rmcp running service
    client: RunningService<RoleClient, ClientInfo>,
    /// Logger
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect using any supported transport
    pub async fn connect(transport: &McpTransport, logger: Arc<dyn Logger>) -> McpResult<Self> {
        match transport {
            McpTransport::Stdio { command, args, env } => {
                Self::connect_stdio(command, args, env, logger).await
            }
            McpTransport::Http { url } => Self::connect_http(url, logger).await,
            #[cfg(unix)]
            McpTransport::Unix { path } => Self::connect_unix(path, logger).await,
            #[cfg(not(unix))]
            McpTransport::Unix { .. } => Err(McpError::ConnectionFailed(
                "Unix sockets are not supported on this platform".to_string(),
            )),
        }
    }

    /// Spawn an MCP server as a child process and connect over stdio
    pub async fn connect_stdio(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Spawning stdio server: {} {}", command, args.join(" ")));

        let mut cmd = Command::new(command);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        socket_path: P,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let path = socket_path.as_ref();
        logger.info(&format!("[McpClient] Connecting to Unix socket: {:?}", path));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let client = client_info()
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        url: &str,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self { client, logger })
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools",
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        self.logger.debug(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = self
            .client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        Ok(result)
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }

    /// Close the connection
    pub async fn close(self) -> McpResult<()> {
        self.logger.info("[McpClient] Closing connection");
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_transport_deserialization() {
        let yaml = r#"
transport: stdio
command: python
args: ["-m", "mcp_modules.openmetadata.src"]
"#;
        let transport: McpTransport = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            transport,
            McpTransport::stdio(
                "python",
                vec!["-m".to_string(), "mcp_modules.openmetadata.src".to_string()]
            )
        );

        let http: McpTransport =
            serde_json::from_value(serde_json::json!({"transport": "http", "url": "http://localhost:8000/mcp"}))
                .unwrap();
        assert!(matches!(http, McpTransport::Http { .. }));
    }

    #[tokio::test]
    async fn test_spawn_missing_command_fails() {
        let transport = McpTransport::stdio("/nonexistent/mcpchat-test-server", vec![]);
        let result = McpClient::connect(&transport, Arc::new(NoOpLogger)).await;
        assert!(matches!(result, Err(McpError::ConnectionFailed(_))));
    }
}
