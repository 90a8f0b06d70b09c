//! Read-only PostgreSQL access for mcpchat
//!
//! [`QueryGateway`] validates every input before any SQL is built, then runs
//! it on a single lazily created pool owned by [`PoolManager`].
//! [`PostgresToolSession`] exposes the gateway as an in-process tool provider
//! so the dispatcher can call it like any MCP server.
//!
//! ```rust,ignore
//! use mcpchat_postgres::PostgresToolSession;
//!
//! let session = PostgresToolSession::from_config(None, &config.database, secrets, logger.clone())?;
//! chat.connect_provider("postgres", Arc::new(session)).await;
//! ```

pub mod error;
pub mod validate;
pub mod settings;
pub mod pool;
pub mod gateway;
pub mod format;
pub mod tools;

pub use error::{GatewayError, GatewayResult};
pub use validate::{validate_identifier, validate_paging, validate_select, QualifiedName};
pub use settings::{describe_environment, redact_connection_string, ConnectTarget, ConnectionSettings, PoolSettings};
pub use pool::PoolManager;
pub use gateway::{ColumnInfo, ColumnMeta, ConnectionReport, QueryGateway, QueryResult, TableRef, TableSchema};
pub use tools::{PostgresToolSession, PROVIDER_NAME};
