//! In-process tool provider over the query gateway

use std::sync::Arc;

use async_trait::async_trait;
use mcpchat_core::config::DatabaseSettings;
use mcpchat_core::logging::Logger;
use mcpchat_core::secrets::SecretStore;
use mcpchat_core::session::{SessionResult, ToolSession};
use mcpchat_core::types::{ToolDescriptor, ToolOutcome};
use mcpchat_core::{log_debug, log_warn};
use serde_json::{json, Value};

use crate::error::GatewayResult;
use crate::format;
use crate::gateway::{QueryGateway, DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::pool::PoolManager;
use crate::settings::{describe_environment, ConnectionSettings};

pub const PROVIDER_NAME: &str = "postgres";

pub const DEBUG_ENV: &str = "debug_postgres_env";
pub const CONNECT: &str = "connect_postgres";
pub const LIST_TABLES: &str = "list_postgres_tables";
pub const QUERY_TABLE: &str = "query_postgres_table";
pub const EXECUTE_QUERY: &str = "execute_postgres_query";
pub const GET_SCHEMA: &str = "get_postgres_schema";

/// Exposes the gateway's operations as tools
///
/// Every failure, including validation and database errors, comes back as
/// [`ToolOutcome::Failure`]. This session never reports a transport error.
/// For a session built by [`from_config`](Self::from_config),
/// `connect_postgres` resolves the connection settings again, so a changed
/// `DATABASE_URL` or `PG*` variable takes effect without a restart.
pub struct PostgresToolSession {
    gateway: QueryGateway,
    /// Where the settings came from: explicit URL and file section
    source: Option<(Option<String>, DatabaseSettings)>,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl PostgresToolSession {
    pub fn new(gateway: QueryGateway, secrets: Arc<dyn SecretStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            gateway,
            source: None,
            secrets,
            logger,
        }
    }

    /// Resolve connection settings and build a session with a lazy pool
    pub fn from_config(
        explicit_url: Option<&str>,
        database: &DatabaseSettings,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> GatewayResult<Self> {
        let settings = ConnectionSettings::resolve(explicit_url, database, secrets.as_ref())?;
        let pool = Arc::new(PoolManager::new(settings, logger.clone()));
        let gateway = QueryGateway::new(pool, logger.clone());
        Ok(Self {
            source: Some((explicit_url.map(str::to_string), database.clone())),
            ..Self::new(gateway, secrets, logger)
        })
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    async fn run(&self, name: &str, arguments: &Value) -> Result<String, String> {
        match name {
            DEBUG_ENV => Ok(format::render_environment(&describe_environment(self.secrets.as_ref()))),
            CONNECT => {
                let resolved = self.source.as_ref().map(|(explicit_url, database)| {
                    ConnectionSettings::resolve(explicit_url.as_deref(), database, self.secrets.as_ref())
                });
                let report = match resolved {
                    Some(Ok(settings)) => self.gateway.connect_with(settings).await,
                    Some(Err(e)) => {
                        log_warn!(self.logger, "[PostgresToolSession] Keeping current settings: {}", e);
                        self.gateway.connect().await
                    }
                    None => self.gateway.connect().await,
                }
                .map_err(|e| format!("Connection failed: {}", e))?;
                Ok(format::render_connection(&report))
            }
            LIST_TABLES => {
                let tables = self
                    .gateway
                    .list_tables()
                    .await
                    .map_err(|e| format!("Failed to list tables: {}", e))?;
                Ok(format::render_tables(&tables))
            }
            QUERY_TABLE => {
                let table = required_str(arguments, "table_name")?;
                let limit = optional_i64(arguments, "limit")?.unwrap_or(DEFAULT_LIMIT);
                let offset = optional_i64(arguments, "offset")?.unwrap_or(DEFAULT_OFFSET);
                let result = self
                    .gateway
                    .query_table(table, Some(limit), Some(offset))
                    .await
                    .map_err(|e| format!("Failed to query table `{}`: {}", table, e))?;
                Ok(format::render_query_result(
                    &format!("**Query results for `{}`:**", table),
                    &result,
                ))
            }
            EXECUTE_QUERY => {
                let query = required_str(arguments, "query")?;
                let result = self
                    .gateway
                    .execute_query(query)
                    .await
                    .map_err(|e| format!("Failed to execute query: {}", e))?;
                Ok(format::render_query_result("**Custom query results:**", &result))
            }
            GET_SCHEMA => {
                let table = required_str(arguments, "table_name")?;
                let schema = self
                    .gateway
                    .get_table_schema(table)
                    .await
                    .map_err(|e| format!("Failed to get schema for `{}`: {}", table, e))?;
                Ok(format::render_schema(&schema))
            }
            other => Err(format!("Unknown tool: {}", other)),
        }
    }
}

#[async_trait]
impl ToolSession for PostgresToolSession {
    fn kind(&self) -> &str {
        PROVIDER_NAME
    }

    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        Ok(descriptors())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> SessionResult<ToolOutcome> {
        log_debug!(self.logger, "[PostgresToolSession] {} {}", name, arguments);
        Ok(match self.run(name, &arguments).await {
            Ok(text) => ToolOutcome::success(text),
            Err(message) => {
                log_warn!(self.logger, "[PostgresToolSession] {} failed: {}", name, message);
                ToolOutcome::failure(message)
            }
        })
    }
}

/// Declarations of the six Postgres tools
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(DEBUG_ENV, "Show which PostgreSQL connection variables are set, with secrets masked"),
        ToolDescriptor::new(CONNECT, "Connect to the PostgreSQL database and report the server version"),
        ToolDescriptor::new(LIST_TABLES, "List all tables in the connected PostgreSQL database"),
        ToolDescriptor::new(QUERY_TABLE, "Query data from a specific table").with_schema(json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table (can include schema like 'public.users')"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum rows to return",
                    "default": DEFAULT_LIMIT
                },
                "offset": {
                    "type": "integer",
                    "description": "Number of rows to skip",
                    "default": DEFAULT_OFFSET
                }
            },
            "required": ["table_name"]
        })),
        ToolDescriptor::new(EXECUTE_QUERY, "Execute a custom SELECT query").with_schema(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL SELECT query to execute"
                }
            },
            "required": ["query"]
        })),
        ToolDescriptor::new(GET_SCHEMA, "Get detailed schema information for a table").with_schema(json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table (can include schema)"
                }
            },
            "required": ["table_name"]
        })),
    ]
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, String> {
    match arguments.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(format!("Missing required argument `{}`", key)),
        Some(_) => Err(format!("Argument `{}` must be a string", key)),
    }
}

fn optional_i64(arguments: &Value, key: &str) -> Result<Option<i64>, String> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("Argument `{}` must be an integer", key)),
    }
}
