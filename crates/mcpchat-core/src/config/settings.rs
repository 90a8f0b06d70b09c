//! Configuration file sections and their resolution

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::conversation::PostToolPolicy;
use crate::dispatch::DEFAULT_CALL_TIMEOUT;
use crate::mcp::McpTransport;
use crate::model::{AzureOpenAiConfig, CompletionOptions, DEFAULT_API_VERSION};
use crate::secrets::SecretStore;

use super::error::{ConfigError, ConfigResult};

pub const AZURE_ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const AZURE_API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

/// Whole configuration file
///
/// ```yaml
/// llm:
///   deployment: gpt-4o
///   temperature: 0.2
/// dispatch:
///   policy: direct
///   tool_timeout_secs: 30
///   disabled_tools: [execute_postgres_query]
/// database:
///   host: db.internal
///   max_connections: 5
/// catalog:
///   host: http://localhost:8585
///   fqn_prefixes: [warehouse.shop.public]
/// mcp_servers:
///   openmetadata:
///     transport: stdio
///     command: python
///     args: ["-m", "mcp_modules.openmetadata.src"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub llm: LlmSettings,
    pub dispatch: DispatchSettings,
    pub database: DatabaseSettings,
    pub catalog: CatalogSettings,
    /// MCP servers connected at startup, by provider name
    pub mcp_servers: BTreeMap<String, McpTransport>,
}

impl ConfigFile {
    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn merge(mut self, other: ConfigFile) -> ConfigFile {
        self.llm = self.llm.merge(other.llm);
        self.dispatch = self.dispatch.merge(other.dispatch);
        self.database = self.database.merge(other.database);
        self.catalog = self.catalog.merge(other.catalog);
        self.mcp_servers.extend(other.mcp_servers);
        self
    }
}

fn overlay<T>(base: Option<T>, top: Option<T>) -> Option<T> {
    top.or(base)
}

/// Model endpoint settings
///
/// The API key is never read from the file; it comes from the secret store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl LlmSettings {
    fn merge(self, other: LlmSettings) -> LlmSettings {
        LlmSettings {
            endpoint: overlay(self.endpoint, other.endpoint),
            deployment: overlay(self.deployment, other.deployment),
            api_version: overlay(self.api_version, other.api_version),
            temperature: overlay(self.temperature, other.temperature),
            max_tokens: overlay(self.max_tokens, other.max_tokens),
            request_timeout_secs: overlay(self.request_timeout_secs, other.request_timeout_secs),
            system_prompt: overlay(self.system_prompt, other.system_prompt),
        }
    }

    /// Combine file values with variables from `secrets`.
    ///
    /// File values win over variables. Every missing required variable is
    /// reported at once.
    pub fn resolve(&self, secrets: &dyn SecretStore) -> ConfigResult<AzureOpenAiConfig> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        let endpoint = non_empty(&self.endpoint).or_else(|| secrets.first_of(&[AZURE_ENDPOINT_VAR]));
        let api_key = secrets.first_of(&[AZURE_API_KEY_VAR]);
        let deployment =
            non_empty(&self.deployment).or_else(|| secrets.first_of(&[AZURE_DEPLOYMENT_VAR]));

        let missing: Vec<String> = [
            (AZURE_ENDPOINT_VAR, endpoint.is_none()),
            (AZURE_API_KEY_VAR, api_key.is_none()),
            (AZURE_DEPLOYMENT_VAR, deployment.is_none()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(endpoint), Some(api_key), Some(deployment)) = (endpoint, api_key, deployment) else {
            return Err(ConfigError::missing("Azure OpenAI", missing));
        };

        let api_version = non_empty(&self.api_version)
            .or_else(|| secrets.first_of(&[AZURE_API_VERSION_VAR]))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::invalid("llm.temperature", "must be between 0.0 and 2.0"));
            }
        }

        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut config = AzureOpenAiConfig::new(endpoint, deployment, api_key)
            .with_api_version(api_version)
            .with_options(options);
        if let Some(secs) = self.request_timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Tool dispatch settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PostToolPolicy>,
    /// Per-call timeout in seconds; 0 disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,
    /// Tools never offered to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_tools: Option<Vec<String>>,
}

impl DispatchSettings {
    fn merge(self, other: DispatchSettings) -> DispatchSettings {
        DispatchSettings {
            policy: overlay(self.policy, other.policy),
            tool_timeout_secs: overlay(self.tool_timeout_secs, other.tool_timeout_secs),
            disabled_tools: overlay(self.disabled_tools, other.disabled_tools),
        }
    }

    pub fn disabled_tools(&self) -> &[String] {
        self.disabled_tools.as_deref().unwrap_or_default()
    }

    pub fn policy(&self) -> PostToolPolicy {
        self.policy.unwrap_or_default()
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        match self.tool_timeout_secs {
            None => Some(DEFAULT_CALL_TIMEOUT),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        }
    }
}

/// Database connection settings
///
/// Resolved against `DATABASE_URL` / `PG*` variables by the Postgres
/// provider; values here take precedence over the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Set to false to skip the built-in Postgres provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    fn merge(self, other: DatabaseSettings) -> DatabaseSettings {
        DatabaseSettings {
            enabled: overlay(self.enabled, other.enabled),
            url: overlay(self.url, other.url),
            host: overlay(self.host, other.host),
            port: overlay(self.port, other.port),
            database: overlay(self.database, other.database),
            user: overlay(self.user, other.user),
            min_connections: overlay(self.min_connections, other.min_connections),
            max_connections: overlay(self.max_connections, other.max_connections),
            acquire_timeout_secs: overlay(self.acquire_timeout_secs, other.acquire_timeout_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Data catalog (OpenMetadata) settings
///
/// Credentials are never read from the file; they come from
/// `OPENMETADATA_JWT_TOKEN` or `OPENMETADATA_USERNAME`/`OPENMETADATA_PASSWORD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Set to false to skip the built-in catalog provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Server base URL, overriding `OPENMETADATA_HOST`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Prefixes tried, in order, when a bare table name does not resolve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqn_prefixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl CatalogSettings {
    fn merge(self, other: CatalogSettings) -> CatalogSettings {
        CatalogSettings {
            enabled: overlay(self.enabled, other.enabled),
            host: overlay(self.host, other.host),
            fqn_prefixes: overlay(self.fqn_prefixes, other.fqn_prefixes),
            request_timeout_secs: overlay(self.request_timeout_secs, other.request_timeout_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn fqn_prefixes(&self) -> &[String] {
        self.fqn_prefixes.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    fn azure_env() -> MemorySecretStore {
        MemorySecretStore::from_pairs([
            (AZURE_ENDPOINT_VAR, "https://example.openai.azure.com"),
            (AZURE_API_KEY_VAR, "key-123"),
            (AZURE_DEPLOYMENT_VAR, "gpt-4o"),
        ])
    }

    #[test]
    fn test_resolve_from_variables() {
        let config = LlmSettings::default().resolve(&azure_env()).unwrap();
        assert_eq!(config.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.deployment, "gpt-4o");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_file_values_win() {
        let settings = LlmSettings {
            deployment: Some("gpt-4o-mini".into()),
            api_version: Some("2024-06-01".into()),
            temperature: Some(0.1),
            ..Default::default()
        };
        let config = settings.resolve(&azure_env()).unwrap();
        assert_eq!(config.deployment, "gpt-4o-mini");
        assert_eq!(config.api_version, "2024-06-01");
        assert_eq!(config.options.temperature, Some(0.1));
    }

    #[test]
    fn test_all_missing_variables_listed() {
        let store = MemorySecretStore::from_pairs([(AZURE_DEPLOYMENT_VAR, "gpt-4o")]);
        match LlmSettings::default().resolve(&store) {
            Err(ConfigError::MissingVariables { variables, .. }) => {
                assert_eq!(variables, vec![AZURE_ENDPOINT_VAR, AZURE_API_KEY_VAR]);
            }
            other => panic!("expected missing variables, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_temperature() {
        let settings = LlmSettings {
            temperature: Some(3.5),
            ..Default::default()
        };
        assert!(matches!(
            settings.resolve(&azure_env()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_dispatch_defaults() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.policy(), PostToolPolicy::Summarized);
        assert_eq!(settings.call_timeout(), Some(DEFAULT_CALL_TIMEOUT));

        let disabled = DispatchSettings {
            tool_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(disabled.call_timeout(), None);
    }

    #[test]
    fn test_merge_workspace_over_user() {
        let user: ConfigFile = serde_yaml::from_str(
            r#"
llm:
  deployment: gpt-4o
  temperature: 0.5
database:
  host: db.internal
mcp_servers:
  openmetadata:
    transport: stdio
    command: python
"#,
        )
        .unwrap();
        let workspace: ConfigFile = serde_yaml::from_str(
            r#"
llm:
  temperature: 0.0
dispatch:
  policy: direct
  disabled_tools: [execute_postgres_query]
catalog:
  host: http://localhost:8585
mcp_servers:
  catalog:
    transport: http
    url: http://localhost:8000/mcp
"#,
        )
        .unwrap();

        let merged = user.merge(workspace);
        assert_eq!(merged.llm.deployment.as_deref(), Some("gpt-4o"));
        assert_eq!(merged.llm.temperature, Some(0.0));
        assert_eq!(merged.dispatch.policy(), PostToolPolicy::Direct);
        assert_eq!(merged.database.host.as_deref(), Some("db.internal"));
        assert!(merged.database.is_enabled());
        assert_eq!(merged.dispatch.disabled_tools(), ["execute_postgres_query".to_string()]);
        assert_eq!(merged.catalog.host.as_deref(), Some("http://localhost:8585"));
        assert!(merged.catalog.fqn_prefixes().is_empty());
        assert_eq!(
            merged.mcp_servers.keys().collect::<Vec<_>>(),
            vec!["catalog", "openmetadata"]
        );
    }
}
