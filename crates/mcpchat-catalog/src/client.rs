//! OpenMetadata REST client
//!
//! Speaks the subset of `/api/v1` the catalog tools need: server version,
//! table listing and table lookup by fully qualified name or ID.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mcpchat_core::config::ConfigError;
use mcpchat_core::logging::Logger;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{CatalogError, CatalogResult};
use crate::settings::{CatalogAuth, CatalogConnection, HOST_VAR};

/// A table entity as the catalog describes it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogTable {
    pub id: String,
    pub name: String,
    pub fully_qualified_name: String,
    pub description: Option<String>,
    pub columns: Vec<CatalogColumn>,
}

impl Default for CatalogTable {
    fn default() -> Self {
        Self {
            id: "Unknown".to_string(),
            name: "Unknown".to_string(),
            fully_qualified_name: "Unknown".to_string(),
            description: None,
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub description: Option<String>,
}

impl Default for CatalogColumn {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            data_type: "Unknown".to_string(),
            description: None,
        }
    }
}

/// A table found by [`CatalogClient::find_table`]
#[derive(Debug, Clone, PartialEq)]
pub struct TableLookup {
    pub table: CatalogTable,
    /// How the table was found
    pub method: String,
    /// Every lookup tried, in order
    pub attempts: Vec<String>,
}

/// Every lookup failed; `error` is the last one
#[derive(Debug)]
pub struct LookupFailure {
    pub attempts: Vec<String>,
    pub error: CatalogError,
}

#[derive(Deserialize)]
struct TableList {
    #[serde(default)]
    data: Vec<CatalogTable>,
}

#[derive(Deserialize)]
struct VersionBody {
    version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for one catalog server
///
/// A username/password login runs once; the access token is cached for the
/// life of the client.
pub struct CatalogClient {
    connection: CatalogConnection,
    base: Url,
    http: reqwest::Client,
    token: Mutex<Option<String>>,
    logger: Arc<dyn Logger>,
}

impl CatalogClient {
    /// Create a client. Fails if the host is not an absolute URL.
    pub fn new(connection: CatalogConnection, logger: Arc<dyn Logger>) -> CatalogResult<Self> {
        let base = Url::parse(&connection.host)
            .map_err(|e| ConfigError::invalid(HOST_VAR, format!("{}: {}", connection.host, e)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::invalid(HOST_VAR, format!("{} is not a base URL", connection.host)).into());
        }

        let http = reqwest::Client::builder()
            .timeout(connection.request_timeout)
            .build()?;

        let token = match &connection.auth {
            CatalogAuth::Token(token) => Some(token.clone()),
            CatalogAuth::Login { .. } => None,
        };

        Ok(Self {
            connection,
            base,
            http,
            token: Mutex::new(token),
            logger,
        })
    }

    pub fn connection(&self) -> &CatalogConnection {
        &self.connection
    }

    /// `{host}/api/v1/{segments...}`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    async fn bearer(&self) -> CatalogResult<String> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }

        let fresh = match &self.connection.auth {
            CatalogAuth::Token(token) => token.clone(),
            CatalogAuth::Login { username, password } => self.login(username, password).await?,
        };
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    async fn login(&self, username: &str, password: &str) -> CatalogResult<String> {
        self.logger.info(&format!("[CatalogClient] Logging in as {}", username));
        let response = self
            .http
            .post(self.endpoint(&["users", "login"]))
            .json(&json!({
                "email": username,
                "password": STANDARD.encode(password),
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Auth {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        let login: LoginBody = serde_json::from_str(&body)?;
        Ok(login.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> CatalogResult<T> {
        let token = self.bearer().await?;
        let url = self.endpoint(segments);
        self.logger.debug(&format!("[CatalogClient] GET {}", url.path()));

        let response = self.http.get(url).bearer_auth(token).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(serde_json::from_str(&body)?),
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(error_message(&body))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Auth {
                status: status.as_u16(),
                message: error_message(&body),
            }),
            _ => {
                self.logger.warn(&format!("[CatalogClient] HTTP {} from {}", status.as_u16(), segments.join("/")));
                Err(CatalogError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }

    /// Server version, which also proves the credentials work
    pub async fn server_version(&self) -> CatalogResult<String> {
        let body: VersionBody = self.get_json(&["system", "version"], &[]).await?;
        Ok(body.version)
    }

    pub async fn list_tables(&self, limit: u32) -> CatalogResult<Vec<CatalogTable>> {
        let list: TableList = self.get_json(&["tables"], &[("limit", limit.to_string())]).await?;
        Ok(list.data)
    }

    pub async fn table_by_name(&self, fqn: &str) -> CatalogResult<CatalogTable> {
        self.get_json(&["tables", "name", fqn], &[("fields", "columns".to_string())]).await
    }

    pub async fn table_by_id(&self, id: &str) -> CatalogResult<CatalogTable> {
        self.get_json(&["tables", id], &[("fields", "columns".to_string())]).await
    }

    /// Find a table by exact name, then by each configured prefix for a bare
    /// name, then by ID.
    ///
    /// Stops early on errors that no other lookup would avoid, such as a
    /// refused connection or rejected credentials.
    pub async fn find_table(&self, name: &str) -> Result<TableLookup, LookupFailure> {
        let mut attempts = Vec::new();

        let mut candidates = vec![name.to_string()];
        if !name.contains('.') {
            candidates.extend(
                self.connection
                    .fqn_prefixes
                    .iter()
                    .map(|prefix| format!("{}.{}", prefix.trim_end_matches('.'), name)),
            );
        }

        for fqn in &candidates {
            match self.table_by_name(fqn).await {
                Ok(table) => {
                    attempts.push(format!("name {} - found", fqn));
                    return Ok(TableLookup {
                        table,
                        method: format!("name ({})", fqn),
                        attempts,
                    });
                }
                Err(error) if error.is_fatal() => {
                    attempts.push(format!("name {} - failed", fqn));
                    return Err(LookupFailure { attempts, error });
                }
                Err(error) => attempts.push(format!("name {} - {}", fqn, short_reason(&error))),
            }
        }

        match self.table_by_id(name).await {
            Ok(table) => {
                attempts.push(format!("id {} - found", name));
                Ok(TableLookup {
                    table,
                    method: "id".to_string(),
                    attempts,
                })
            }
            Err(error) => {
                attempts.push(format!("id {} - {}", name, short_reason(&error)));
                Err(LookupFailure { attempts, error })
            }
        }
    }
}

fn short_reason(error: &CatalogError) -> String {
    match error {
        CatalogError::NotFound(_) => "not found".to_string(),
        CatalogError::Api { status, .. } => format!("HTTP {}", status),
        _ => "failed".to_string(),
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body.trim().to_string(),
    }
}
