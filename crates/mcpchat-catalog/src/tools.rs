//! In-process tool provider over the catalog client

use std::sync::Arc;

use async_trait::async_trait;
use mcpchat_core::config::CatalogSettings;
use mcpchat_core::logging::Logger;
use mcpchat_core::secrets::SecretStore;
use mcpchat_core::session::{SessionResult, ToolSession};
use mcpchat_core::types::{ToolDescriptor, ToolOutcome};
use mcpchat_core::{log_debug, log_info, log_warn};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::client::CatalogClient;
use crate::error::CatalogResult;
use crate::format;
use crate::settings::{describe_environment, CatalogConnection};

pub const PROVIDER_NAME: &str = "openmetadata";

pub const DEBUG_ENV: &str = "debug_env";
pub const TEST_CONNECTION: &str = "test_om_connection";
pub const LIST_TABLES: &str = "list_om_tables";
pub const GET_TABLE: &str = "get_om_table";

pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Exposes catalog lookups as tools
///
/// Settings are resolved on every call, so changed `OPENMETADATA_*`
/// variables apply without a restart. The client, and with it any login
/// token, is kept while the settings stay the same. `debug_env` works even
/// when nothing is configured.
pub struct CatalogToolSession {
    settings: CatalogSettings,
    secrets: Arc<dyn SecretStore>,
    client: Mutex<Option<Arc<CatalogClient>>>,
    logger: Arc<dyn Logger>,
}

impl CatalogToolSession {
    pub fn new(settings: CatalogSettings, secrets: Arc<dyn SecretStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            settings,
            secrets,
            client: Mutex::new(None),
            logger,
        }
    }

    /// Whether host and credentials currently resolve
    pub fn is_configured(&self) -> bool {
        CatalogConnection::resolve(&self.settings, self.secrets.as_ref()).is_ok()
    }

    fn client(&self) -> CatalogResult<Arc<CatalogClient>> {
        let connection = CatalogConnection::resolve(&self.settings, self.secrets.as_ref())?;

        let mut cached = self.client.lock();
        if let Some(client) = cached.as_ref().filter(|c| *c.connection() == connection) {
            return Ok(Arc::clone(client));
        }

        log_info!(self.logger, "[CatalogToolSession] Using catalog at {}", connection.host);
        let client = Arc::new(CatalogClient::new(connection, Arc::clone(&self.logger))?);
        *cached = Some(Arc::clone(&client));
        Ok(client)
    }

    async fn run(&self, name: &str, arguments: &Value) -> Result<String, String> {
        match name {
            DEBUG_ENV => Ok(format::render_environment(&describe_environment(self.secrets.as_ref()))),
            TEST_CONNECTION => {
                let client = self.client().map_err(|e| format!("Connection test failed: {}", e))?;
                let version = client
                    .server_version()
                    .await
                    .map_err(|e| format!("Connection test failed: {}", e))?;
                Ok(format::render_connection(&client.connection().host, &version))
            }
            LIST_TABLES => {
                let limit = optional_limit(arguments)?.unwrap_or(DEFAULT_LIST_LIMIT);
                let client = self.client().map_err(|e| format!("Failed to list tables: {}", e))?;
                let tables = client
                    .list_tables(limit)
                    .await
                    .map_err(|e| format!("Failed to list tables: {}", e))?;
                Ok(format::render_tables(&tables))
            }
            GET_TABLE => {
                let table_name = required_str(arguments, "table_name")?;
                let client = self
                    .client()
                    .map_err(|e| format!("Failed to get table `{}`: {}", table_name, e))?;
                let lookup = client
                    .find_table(table_name)
                    .await
                    .map_err(|failure| format::render_lookup_failure(table_name, &failure))?;
                Ok(format::render_table(&lookup))
            }
            other => Err(format!("Unknown tool: {}", other)),
        }
    }
}

#[async_trait]
impl ToolSession for CatalogToolSession {
    fn kind(&self) -> &str {
        PROVIDER_NAME
    }

    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        Ok(descriptors())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> SessionResult<ToolOutcome> {
        log_debug!(self.logger, "[CatalogToolSession] {} {}", name, arguments);
        Ok(match self.run(name, &arguments).await {
            Ok(text) => ToolOutcome::success(text),
            Err(message) => {
                log_warn!(self.logger, "[CatalogToolSession] {} failed: {}", name, message);
                ToolOutcome::failure(message)
            }
        })
    }
}

/// Declarations of the four catalog tools
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(DEBUG_ENV, "Show which OpenMetadata environment variables are set, with secrets hidden"),
        ToolDescriptor::new(TEST_CONNECTION, "Test the OpenMetadata connection and report the server version"),
        ToolDescriptor::new(LIST_TABLES, "List tables from the OpenMetadata catalog").with_schema(json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of tables to return",
                    "default": DEFAULT_LIST_LIMIT
                }
            },
            "required": []
        })),
        ToolDescriptor::new(GET_TABLE, "Get detailed information about a specific table").with_schema(json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Table name, fully qualified name, or ID"
                }
            },
            "required": ["table_name"]
        })),
    ]
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, String> {
    match arguments.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(format!("Missing required argument `{}`", key)),
        Some(_) => Err(format!("Argument `{}` must be a string", key)),
    }
}

fn optional_limit(arguments: &Value) -> Result<Option<u32>, String> {
    match arguments.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| "Argument `limit` must be a positive integer".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{HOST_VAR, TOKEN_VAR};
    use mcpchat_core::logging::NoOpLogger;
    use mcpchat_core::secrets::MemorySecretStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(store: Arc<MemorySecretStore>) -> CatalogToolSession {
        let secrets: Arc<dyn SecretStore> = store;
        CatalogToolSession::new(CatalogSettings::default(), secrets, Arc::new(NoOpLogger))
    }

    fn configured(server: &MockServer) -> Arc<MemorySecretStore> {
        Arc::new(MemorySecretStore::from_pairs([
            (HOST_VAR, server.uri().as_str()),
            (TOKEN_VAR, "tok-123"),
        ]))
    }

    #[tokio::test]
    async fn test_lists_four_tools() {
        let tools = session(Arc::new(MemorySecretStore::new())).list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![DEBUG_ENV, TEST_CONNECTION, LIST_TABLES, GET_TABLE]);
        assert_eq!(tools[2].input_schema["properties"]["limit"]["default"], json!(10));
        assert_eq!(tools[3].input_schema["required"], json!(["table_name"]));
    }

    #[tokio::test]
    async fn test_debug_env_without_configuration() {
        let store = Arc::new(MemorySecretStore::from_pairs([(TOKEN_VAR, "eyJhbGciOi")]));
        let session = session(store);
        assert!(!session.is_configured());

        let outcome = session.call_tool(DEBUG_ENV, json!({})).await.unwrap();
        assert!(outcome.is_success());
        assert!(outcome.text().contains("`OPENMETADATA_HOST`: NOT SET"));
        assert!(outcome.text().contains("`OPENMETADATA_JWT_TOKEN`: SET"));
        assert!(!outcome.text().contains("eyJhbGciOi"));

        let outcome = session.call_tool(TEST_CONNECTION, json!({})).await.unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.text().contains("OPENMETADATA_HOST"));
    }

    #[tokio::test]
    async fn test_list_tables_uses_default_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tables"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "abcdef0123456789", "name": "orders", "fullyQualifiedName": "shop.public.orders"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = session(configured(&server))
            .call_tool(LIST_TABLES, json!({}))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(outcome.text().contains("`shop.public.orders`"));
        assert!(outcome.text().contains("Description: No description"));
    }

    #[tokio::test]
    async fn test_get_table_failure_is_an_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = session(configured(&server))
            .call_tool(GET_TABLE, json!({"table_name": "missing"}))
            .await
            .unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.text().starts_with("Failed to get table `missing`"));
        assert!(outcome.text().contains("id missing - not found"));
    }

    #[tokio::test]
    async fn test_client_follows_changed_settings() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        let store = configured(&first);
        let session = session(store.clone());

        let client = session.client().unwrap();
        assert!(Arc::ptr_eq(&client, &session.client().unwrap()));

        store.store(HOST_VAR, &second.uri()).unwrap();
        let moved = session.client().unwrap();
        assert_eq!(moved.connection().host, second.uri());
        assert!(!Arc::ptr_eq(&client, &moved));
    }

    #[tokio::test]
    async fn test_argument_errors() {
        let session = session(Arc::new(MemorySecretStore::new()));
        let outcome = session.call_tool(GET_TABLE, json!({})).await.unwrap();
        assert_eq!(outcome.text(), "Missing required argument `table_name`");

        let outcome = session.call_tool(LIST_TABLES, json!({"limit": 0})).await.unwrap();
        assert_eq!(outcome.text(), "Argument `limit` must be a positive integer");

        let outcome = session.call_tool("drop_catalog", json!({})).await.unwrap();
        assert_eq!(outcome.text(), "Unknown tool: drop_catalog");
    }
}
