//! Azure OpenAI chat-completions client
//!
//! Sends the full history plus the declared tools to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions` and reads back
//! the first choice.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use crate::logging::Logger;
use crate::types::{ChatMessage, ModelReply, ToolDeclaration};

use super::convert::{from_wire_message, to_wire_messages, to_wire_tools, WireErrorBody, WireRequest, WireResponse};
use super::error::{ModelError, ModelResult};
use super::traits::{CompletionOptions, ModelClient};

/// API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Default HTTP timeout for one completion request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const PROVIDER: &str = "azure";

/// Connection settings for one Azure OpenAI deployment
#[derive(Clone, PartialEq)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// Deployment name
    pub deployment: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    pub api_version: String,
    pub options: CompletionOptions,
    pub request_timeout: Duration,
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            options: CompletionOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full chat-completions URL for this deployment
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_key", &"***")
            .field("api_version", &self.api_version)
            .field("options", &self.options)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Model client backed by an Azure OpenAI deployment
pub struct AzureOpenAiClient {
    config: AzureOpenAiConfig,
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl AzureOpenAiClient {
    /// Create a client. Fails if a required setting is empty.
    pub fn new(config: AzureOpenAiConfig, logger: Arc<dyn Logger>) -> ModelResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ModelError::missing_setting(PROVIDER, "Endpoint"));
        }
        if config.deployment.trim().is_empty() {
            return Err(ModelError::missing_setting(PROVIDER, "Deployment name"));
        }
        if config.api_key.trim().is_empty() {
            return Err(ModelError::missing_setting(PROVIDER, "API key"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, http, logger })
    }

    pub fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }

    fn build_request(&self, history: &[ChatMessage], tools: &[ToolDeclaration]) -> WireRequest {
        let tool_choice = if tools.is_empty() { None } else { Some("auto") };
        WireRequest {
            messages: to_wire_messages(history),
            tools: to_wire_tools(tools),
            tool_choice,
            temperature: self.config.options.temperature,
            max_tokens: self.config.options.max_tokens,
        }
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<WireErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl ModelClient for AzureOpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        history: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> ModelResult<ModelReply> {
        self.logger.debug(&format!(
            "[AzureOpenAiClient] Request: deployment={}, messages={}, tools={}",
            self.config.deployment,
            history.len(),
            tools.len()
        ));

        let request = self.build_request(history, tools);
        let response = self
            .http
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::rate_limited(PROVIDER, error_message(&body)));
        }
        if !status.is_success() {
            self.logger.error(&format!("[AzureOpenAiClient] HTTP {}", status.as_u16()));
            return Err(ModelError::api_error(PROVIDER, status.as_u16(), error_message(&body)));
        }

        let parsed: WireResponse = serde_json::from_str(&body)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::invalid_response(PROVIDER, "response contained no choices"))?;

        let reply = from_wire_message(choice.message);
        self.logger.debug(&format!(
            "[AzureOpenAiClient] Reply: finish_reason={}, tool_calls={}",
            choice.finish_reason.as_deref().unwrap_or("none"),
            reply.is_tool_calls()
        ));

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    fn config() -> AzureOpenAiConfig {
        AzureOpenAiConfig::new("https://example.openai.azure.com/", "gpt-4o", "secret-key")
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            config().completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
        assert!(config()
            .with_api_version("2024-06-01")
            .completions_url()
            .ends_with("api-version=2024-06-01"));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_missing_settings_rejected() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        let mut cfg = config();
        cfg.api_key = String::new();
        assert!(matches!(
            AzureOpenAiClient::new(cfg, logger.clone()),
            Err(ModelError::MissingSetting { .. })
        ));

        let mut cfg = config();
        cfg.endpoint = "  ".to_string();
        assert!(AzureOpenAiClient::new(cfg, logger).is_err());
    }

    #[test]
    fn test_request_offers_tools_only_when_present() {
        let client = AzureOpenAiClient::new(
            config().with_options(CompletionOptions::new().with_temperature(0.2)),
            Arc::new(NoOpLogger),
        )
        .unwrap();
        let history = vec![ChatMessage::user("hi")];

        let bare = serde_json::to_value(client.build_request(&history, &[])).unwrap();
        assert!(bare.get("tools").is_none());
        assert!(bare.get("tool_choice").is_none());

        let decl = ToolDeclaration {
            name: "list_postgres_tables".to_string(),
            description: "List tables".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let with_tools = serde_json::to_value(client.build_request(&history, &[decl])).unwrap();
        assert_eq!(with_tools["tool_choice"], "auto");
        assert_eq!(with_tools["tools"][0]["function"]["name"], "list_postgres_tables");
        assert!((with_tools["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error": {"code": "401", "message": "Access denied"}}"#),
            "Access denied"
        );
        assert_eq!(error_message("gateway timeout\n"), "gateway timeout");
    }
}
