//! Catalog connection settings resolution

use std::fmt;
use std::time::Duration;

use mcpchat_core::config::{CatalogSettings, ConfigError};
use mcpchat_core::secrets::SecretStore;

use crate::error::CatalogResult;

pub const HOST_VAR: &str = "OPENMETADATA_HOST";
pub const TOKEN_VAR: &str = "OPENMETADATA_JWT_TOKEN";
pub const USERNAME_VAR: &str = "OPENMETADATA_USERNAME";
pub const PASSWORD_VAR: &str = "OPENMETADATA_PASSWORD";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const NOT_SET: &str = "NOT SET";

/// How requests are authorized
#[derive(Clone, PartialEq, Eq)]
pub enum CatalogAuth {
    /// Bot or personal access token, sent as a bearer token
    Token(String),
    /// Exchanged for an access token on first use
    Login { username: String, password: String },
}

impl fmt::Debug for CatalogAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogAuth::Token(_) => f.write_str("Token(***)"),
            CatalogAuth::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Fully resolved settings for one catalog server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConnection {
    /// Base URL, e.g. `http://localhost:8585`
    pub host: String,
    pub auth: CatalogAuth,
    /// Tried in order when a bare table name does not resolve
    pub fqn_prefixes: Vec<String>,
    pub request_timeout: Duration,
}

impl CatalogConnection {
    pub fn new(host: impl Into<String>, auth: CatalogAuth) -> Self {
        Self {
            host: host.into(),
            auth,
            fqn_prefixes: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_fqn_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.fqn_prefixes = prefixes;
        self
    }

    /// Resolve settings from the config file and the secret store.
    ///
    /// The host comes from `catalog.host`, then `OPENMETADATA_HOST`. A JWT
    /// token wins over a username/password pair.
    pub fn resolve(file: &CatalogSettings, secrets: &dyn SecretStore) -> CatalogResult<Self> {
        let host = file
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| secrets.first_of(&[HOST_VAR]));

        let auth = match (
            secrets.first_of(&[TOKEN_VAR]),
            secrets.first_of(&[USERNAME_VAR]),
            secrets.first_of(&[PASSWORD_VAR]),
        ) {
            (Some(token), _, _) => Some(CatalogAuth::Token(token)),
            (None, Some(username), Some(password)) => Some(CatalogAuth::Login { username, password }),
            _ => None,
        };

        match (host, auth) {
            (Some(host), Some(auth)) => Ok(Self {
                host: host.trim().to_string(),
                auth,
                fqn_prefixes: file.fqn_prefixes().to_vec(),
                request_timeout: file
                    .request_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            }),
            (host, auth) => {
                let mut missing = Vec::new();
                if host.is_none() {
                    missing.push(HOST_VAR.to_string());
                }
                if auth.is_none() {
                    missing.push(TOKEN_VAR.to_string());
                }
                Err(ConfigError::missing("OpenMetadata", missing).into())
            }
        }
    }
}

/// Catalog variables for display: plain values for host and username,
/// only "SET" or "NOT SET" for the token and password
pub fn describe_environment(secrets: &dyn SecretStore) -> Vec<(String, String)> {
    [
        (HOST_VAR, false),
        (TOKEN_VAR, true),
        (USERNAME_VAR, false),
        (PASSWORD_VAR, true),
    ]
    .iter()
    .map(|(var, is_secret)| {
        let shown = match secrets.get(var).filter(|v| !v.trim().is_empty()) {
            Some(_) if *is_secret => "SET".to_string(),
            Some(value) => value,
            None => NOT_SET.to_string(),
        };
        (var.to_string(), shown)
    })
    .collect()
}
