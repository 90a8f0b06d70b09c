//! mcpchat core
//!
//! Tool-call orchestration for a chat agent whose tools live behind MCP
//! (Model Context Protocol) servers or in-process providers.
//!
//! ## Turn flow
//!
//! ```text
//! user message ─► ChatSession ─► ModelClient (history + declarations)
//!                     │
//!                     ├─ text ──────────────────────────────► surfaced
//!                     │
//!                     └─ tool calls ─► Dispatcher ─► ToolRegistry ─► ToolSession
//!                                          │
//!                                          └─ one tool message per call
//!                                             ─► surfaced (Direct)
//!                                             ─► one more model call (Summarized)
//! ```
//!
//! ```rust,ignore
//! use mcpchat_core::{ChatSession, ToolRegistry, ConsoleLogger};
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new());
//! let registry = Arc::new(ToolRegistry::new(logger.clone()));
//! let mut chat = ChatSession::new(registry, model, logger);
//!
//! chat.connect_mcp_server("openmetadata", &transport).await;
//! let report = chat.handle_user_message("Which tables hold orders?").await?;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod model;
pub mod session;
pub mod tools;
pub mod mcp;
pub mod dispatch;
pub mod conversation;

// Re-export commonly used types
pub use types::{
    ChatMessage, MessageRole, ModelReply,
    ToolCall, ToolDeclaration, ToolDescriptor, ToolOutcome,
};

pub use secrets::{
    SecretStore, SecretStoreError, SecretStoreResult,
    EnvSecretStore, MemorySecretStore,
};

pub use logging::{Logger, SharedLogger, NoOpLogger, ConsoleLogger, MemoryLogger};

pub use config::{ConfigError, ConfigFile, ConfigResult, FileConfigProvider};

pub use model::{AzureOpenAiClient, AzureOpenAiConfig, ModelClient, ModelError, ModelResult};

pub use session::{SessionError, SessionResult, ToolSession, McpSession};

pub use tools::{ToolRegistry, ToolFilter, ToolInfo, on_provider_connect, on_provider_disconnect};

pub use dispatch::{Dispatcher, DispatchOutcome};

pub use conversation::{
    ChatSession, ConversationHistory, PostToolPolicy,
    SurfacedMessage, SurfaceKind, TurnError, TurnReport, TurnState,
};

// MCP client using official rmcp SDK
pub use mcp::{McpClient, McpError, McpResult, McpTransport, McpTool, McpToolResult};
