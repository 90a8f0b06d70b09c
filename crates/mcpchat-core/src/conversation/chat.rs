//! Chat session: one conversation driving the model and the tools

use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::logging::Logger;
use crate::mcp::{McpClient, McpTransport};
use crate::model::ModelClient;
use crate::session::{McpSession, ToolSession};
use crate::tools::{on_provider_connect, on_provider_disconnect, ToolRegistry};
use crate::types::{ChatMessage, ModelReply};

use super::history::ConversationHistory;
use super::state::{PostToolPolicy, SurfacedMessage, TurnError, TurnReport, TurnResult, TurnState};

/// One conversation
///
/// Owns its history exclusively. The registry may be shared with other chat
/// sessions; calls against a shared provider are serialized by the registry.
pub struct ChatSession {
    history: ConversationHistory,
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    model: Option<Arc<dyn ModelClient>>,
    config_problem: Option<String>,
    policy: PostToolPolicy,
    logger: Arc<dyn Logger>,
}

impl ChatSession {
    /// Create a session backed by `model`
    pub fn new(
        registry: Arc<ToolRegistry>,
        model: Arc<dyn ModelClient>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::build(registry, Some(model), None, logger)
    }

    /// Create a session without a model.
    ///
    /// Every turn reports `problem` instead of calling the model. Providers
    /// can still be connected and inspected.
    pub fn degraded(
        registry: Arc<ToolRegistry>,
        problem: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::build(registry, None, Some(problem.into()), logger)
    }

    fn build(
        registry: Arc<ToolRegistry>,
        model: Option<Arc<dyn ModelClient>>,
        config_problem: Option<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            history: ConversationHistory::new(),
            dispatcher: Dispatcher::new(Arc::clone(&registry), Arc::clone(&logger)),
            registry,
            model,
            config_problem,
            policy: PostToolPolicy::default(),
            logger,
        }
    }

    pub fn with_policy(mut self, policy: PostToolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-call tool timeout; `None` disables it
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dispatcher = self.dispatcher.with_call_timeout(timeout);
        self
    }

    /// Seed the history with a system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.history.push(ChatMessage::system(prompt));
        self
    }

    /// Keep `names` out of the model's tool list, including tools of
    /// providers connected later
    pub fn with_disabled_tools(self, names: &[String]) -> Self {
        for name in names {
            self.registry.set_tool_enabled(name, false);
        }
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> PostToolPolicy {
        self.policy
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    /// Messages to show once when the session starts
    pub fn startup_notices(&self) -> Vec<SurfacedMessage> {
        match &self.config_problem {
            Some(problem) => vec![SurfacedMessage::error(problem.clone())],
            None => Vec::new(),
        }
    }

    /// Run one turn for a user message.
    ///
    /// On error the turn is abandoned; everything appended before the error
    /// stays in the history.
    pub async fn handle_user_message(&mut self, text: &str) -> TurnResult<TurnReport> {
        let model = match &self.model {
            Some(model) => Arc::clone(model),
            None => {
                let problem = self
                    .config_problem
                    .clone()
                    .unwrap_or_else(|| "no model configured".to_string());
                return Err(TurnError::NotConfigured(problem));
            }
        };

        self.history.push(ChatMessage::user(text));

        let mut path = vec![TurnState::AwaitingModel];
        let mut replies = Vec::new();

        let declarations = self.registry.declarations();
        self.logger.debug(&format!(
            "[ChatSession] Calling {} with {} messages, {} tools",
            model.name(),
            self.history.len(),
            declarations.len()
        ));

        let reply = model
            .complete(self.history.as_slice(), &declarations)
            .await
            .map_err(|e| {
                self.logger.error(&format!("[ChatSession] Model call failed: {}", e));
                TurnError::from(e)
            })?;

        match &reply {
            ModelReply::Text { content } => {
                path.push(TurnState::NoToolCalls);
                self.history.push(reply.to_message());
                replies.push(SurfacedMessage::assistant(content.clone()));
            }
            ModelReply::ToolCalls { calls, .. } => {
                path.push(TurnState::HasToolCalls);
                self.logger.info(&format!("[ChatSession] Model requested {} tool calls", calls.len()));
                self.history.push(reply.to_message());

                path.push(TurnState::Dispatching);
                let outcomes = self.dispatcher.dispatch(calls).await;
                self.history.extend(outcomes.iter().map(|o| o.to_message()));

                match self.policy {
                    PostToolPolicy::Direct => {
                        replies.extend(outcomes.iter().map(SurfacedMessage::tool));
                    }
                    PostToolPolicy::Summarized => {
                        path.push(TurnState::Summarizing);
                        let summary = model.complete(self.history.as_slice(), &[]).await?;
                        match summary {
                            ModelReply::Text { content } => {
                                self.history.push(ChatMessage::assistant(content.clone()));
                                replies.push(SurfacedMessage::assistant(content));
                            }
                            ModelReply::ToolCalls { calls, .. } => {
                                self.logger.warn(&format!(
                                    "[ChatSession] Summarization requested {} tool calls; discarding reply",
                                    calls.len()
                                ));
                                return Err(TurnError::UnexpectedToolCalls { count: calls.len() });
                            }
                        }
                    }
                }
            }
        }

        path.push(TurnState::Resolved);
        Ok(TurnReport { replies, path })
    }

    /// Register a provider session and describe the result for the user
    pub async fn connect_provider(&self, name: &str, session: Arc<dyn ToolSession>) -> SurfacedMessage {
        match on_provider_connect(&self.registry, name, session).await {
            Ok(tools) => {
                let listing = tools
                    .iter()
                    .map(|t| format!("• **{}**: {}", t.name, t.description))
                    .collect::<Vec<_>>()
                    .join("\n");
                SurfacedMessage::notice(format!(
                    "Connected to **{}**.\n\nAvailable tools:\n{}",
                    name, listing
                ))
            }
            Err(e) => {
                self.logger.error(&format!("[ChatSession] Connecting '{}' failed: {}", name, e));
                SurfacedMessage::error(format!("Error connecting to provider {}: {}", name, e))
            }
        }
    }

    /// Connect an MCP server and register its tools
    pub async fn connect_mcp_server(&self, name: &str, transport: &McpTransport) -> SurfacedMessage {
        match McpClient::connect(transport, Arc::clone(&self.logger)).await {
            Ok(client) => self.connect_provider(name, Arc::new(McpSession::new(client))).await,
            Err(e) => {
                self.logger.error(&format!("[ChatSession] Connecting '{}' failed: {}", name, e));
                SurfacedMessage::error(format!("Error connecting to MCP server {}: {}", name, e))
            }
        }
    }

    /// Offer or withhold a connected tool on later model calls
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) -> SurfacedMessage {
        if self.registry.resolve(name).is_none() {
            return SurfacedMessage::notice(format!("No connected tool named {}", name));
        }
        self.registry.set_tool_enabled(name, enabled);
        self.logger.info(&format!("[ChatSession] Tool '{}' enabled={}", name, enabled));
        let state = if enabled { "enabled" } else { "disabled" };
        SurfacedMessage::notice(format!("Tool {} {}", name, state))
    }

    /// Drop a provider; unknown names are a no-op
    pub fn disconnect_provider(&self, name: &str) -> SurfacedMessage {
        if on_provider_disconnect(&self.registry, name) {
            SurfacedMessage::notice(format!("Disconnected from {}", name))
        } else {
            SurfacedMessage::notice(format!("No provider named {} is connected", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::SurfaceKind;
    use crate::logging::NoOpLogger;
    use crate::model::{MockModel, MockStep};
    use crate::session::{MockBehavior, MockToolSession};
    use crate::types::{MessageRole, ToolCall};
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(Arc::new(NoOpLogger)))
    }

    fn two_calls() -> ModelReply {
        ModelReply::tool_calls(vec![
            ToolCall::new("call_1", "list_postgres_tables", json!({})),
            ToolCall::new("call_2", "get_entity_details", json!({"fqn": "svc.db.orders"})),
        ])
    }

    async fn connect_two_providers(chat: &ChatSession) {
        let postgres = MockToolSession::new()
            .with_tool("list_postgres_tables", MockBehavior::Succeed("public.orders".into()));
        let metadata = MockToolSession::new()
            .with_tool("get_entity_details", MockBehavior::Fail("Entity not found".into()));
        chat.connect_provider("postgres", Arc::new(postgres)).await;
        chat.connect_provider("metadata", Arc::new(metadata)).await;
    }

    #[tokio::test]
    async fn test_text_reply() {
        let model = Arc::new(MockModel::echo());
        let mut chat = ChatSession::new(registry(), model, Arc::new(NoOpLogger));

        let report = chat.handle_user_message("hello").await.unwrap();
        assert_eq!(
            report.path,
            vec![TurnState::AwaitingModel, TurnState::NoToolCalls, TurnState::Resolved]
        );
        assert_eq!(report.final_text(), Some("Echo: hello"));
        assert_eq!(chat.history().len(), 2);
    }

    #[tokio::test]
    async fn test_direct_policy_surfaces_each_result() {
        let model = Arc::new(MockModel::scripted(vec![MockStep::Reply(two_calls())]));
        let mut chat = ChatSession::new(registry(), model.clone(), Arc::new(NoOpLogger))
            .with_policy(PostToolPolicy::Direct);
        connect_two_providers(&chat).await;

        let report = chat.handle_user_message("what do we have?").await.unwrap();

        assert_eq!(
            report.path,
            vec![
                TurnState::AwaitingModel,
                TurnState::HasToolCalls,
                TurnState::Dispatching,
                TurnState::Resolved
            ]
        );
        assert_eq!(report.replies.len(), 2);
        assert_eq!(report.replies[0].author, "list_postgres_tables");
        assert_eq!(report.replies[0].kind, SurfaceKind::ToolResult);
        assert_eq!(report.replies[1].author, "get_entity_details");
        assert_eq!(report.replies[1].kind, SurfaceKind::ToolFailure);
        assert_eq!(report.replies[1].content, "Entity not found");

        let roles: Vec<_> = chat.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool, MessageRole::Tool]
        );
        let ids: Vec<_> = chat
            .history()
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
        assert_eq!(model.request_count(), 1);
        assert_eq!(
            model.requests()[0].tool_names,
            vec!["list_postgres_tables", "get_entity_details"]
        );
    }

    #[tokio::test]
    async fn test_direct_policy_surfaces_transport_failure_and_success() {
        let model = Arc::new(MockModel::scripted(vec![MockStep::Reply(ModelReply::tool_calls(vec![
            ToolCall::new("call_1", "foo", json!({})),
            ToolCall::new("call_2", "bar", json!({})),
        ]))]));
        let mut chat = ChatSession::new(registry(), model, Arc::new(NoOpLogger))
            .with_policy(PostToolPolicy::Direct);
        let broken = MockToolSession::new().with_tool("foo", MockBehavior::Transport("pipe closed".into()));
        let working = MockToolSession::new().with_tool("bar", MockBehavior::Succeed("bar ok".into()));
        chat.connect_provider("A", Arc::new(broken)).await;
        chat.connect_provider("B", Arc::new(working)).await;

        let report = chat.handle_user_message("run both").await.unwrap();

        assert_eq!(report.replies.len(), 2);
        assert_eq!(report.replies[0].author, "foo");
        assert_eq!(report.replies[0].kind, SurfaceKind::ToolFailure);
        assert_eq!(report.replies[0].content, "Transport error: pipe closed");
        assert_eq!(report.replies[1], SurfacedMessage {
            author: "bar".into(),
            content: "bar ok".into(),
            kind: SurfaceKind::ToolResult,
        });

        let tool_messages: Vec<_> = chat
            .history()
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .map(|m| (m.tool_call_id.as_deref(), m.text()))
            .collect();
        assert_eq!(
            tool_messages,
            vec![
                (Some("call_1"), Some("Error executing tool: Transport error: pipe closed")),
                (Some("call_2"), Some("bar ok")),
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_tools_are_not_declared() {
        let model = Arc::new(MockModel::echo());
        let mut chat = ChatSession::new(registry(), model.clone(), Arc::new(NoOpLogger))
            .with_disabled_tools(&["get_entity_details".to_string()]);
        connect_two_providers(&chat).await;

        chat.handle_user_message("one").await.unwrap();
        assert_eq!(model.requests()[0].tool_names, vec!["list_postgres_tables"]);

        let notice = chat.set_tool_enabled("get_entity_details", true);
        assert_eq!(notice.content, "Tool get_entity_details enabled");
        chat.set_tool_enabled("list_postgres_tables", false);
        chat.handle_user_message("two").await.unwrap();
        assert_eq!(model.requests()[1].tool_names, vec!["get_entity_details"]);

        let notice = chat.set_tool_enabled("drop_everything", false);
        assert!(notice.content.contains("No connected tool named drop_everything"));
    }

    #[tokio::test]
    async fn test_summarized_policy_calls_model_again_without_tools() {
        let model = Arc::new(MockModel::scripted(vec![
            MockStep::Reply(two_calls()),
            MockStep::Reply(ModelReply::text("One table; the entity is missing.")),
        ]));
        let mut chat = ChatSession::new(registry(), model.clone(), Arc::new(NoOpLogger));
        connect_two_providers(&chat).await;

        let report = chat.handle_user_message("summarize").await.unwrap();

        assert!(report.path.contains(&TurnState::Summarizing));
        assert_eq!(report.replies, vec![SurfacedMessage::assistant("One table; the entity is missing.")]);
        assert_eq!(chat.history().len(), 5);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tool_names.is_empty());
        assert_eq!(requests[1].history.len(), 4);
    }

    #[tokio::test]
    async fn test_summary_with_tool_calls_is_rejected() {
        let model = Arc::new(MockModel::scripted(vec![
            MockStep::Reply(two_calls()),
            MockStep::Reply(ModelReply::tool_calls(vec![ToolCall::new(
                "call_3",
                "list_postgres_tables",
                json!({}),
            )])),
        ]));
        let mut chat = ChatSession::new(registry(), model, Arc::new(NoOpLogger));
        connect_two_providers(&chat).await;

        let err = chat.handle_user_message("go").await.unwrap_err();
        assert!(matches!(err, TurnError::UnexpectedToolCalls { count: 1 }));
        assert_eq!(chat.history().len(), 4);
        assert_eq!(chat.history().last().map(|m| m.role), Some(MessageRole::Tool));
    }

    #[tokio::test]
    async fn test_model_error_keeps_session_alive() {
        let model = Arc::new(MockModel::echo().then_fail("503 Service Unavailable"));
        let mut chat = ChatSession::new(registry(), model, Arc::new(NoOpLogger));

        let err = chat.handle_user_message("first").await.unwrap_err();
        assert!(matches!(err, TurnError::Model(_)));
        assert_eq!(chat.history().len(), 1);

        let report = chat.handle_user_message("second").await.unwrap();
        assert_eq!(report.final_text(), Some("Echo: second"));
        assert_eq!(chat.history().len(), 3);
    }

    #[tokio::test]
    async fn test_history_only_grows() {
        let model = Arc::new(MockModel::scripted(vec![
            MockStep::Reply(two_calls()),
            MockStep::Fail("timeout".into()),
        ]));
        let mut chat = ChatSession::new(registry(), model, Arc::new(NoOpLogger))
            .with_system_prompt("You are a data assistant.");
        connect_two_providers(&chat).await;

        let mut seen = chat.history().as_slice().to_vec();
        for text in ["one", "two", "three"] {
            let _ = chat.handle_user_message(text).await;
            let now = chat.history().as_slice();
            assert!(now.len() > seen.len());
            assert_eq!(&now[..seen.len()], seen.as_slice());
            seen = now.to_vec();
        }
    }

    #[tokio::test]
    async fn test_degraded_session_reports_configuration() {
        let mut chat = ChatSession::degraded(
            registry(),
            "Missing Azure OpenAI environment variables: AZURE_OPENAI_API_KEY",
            Arc::new(NoOpLogger),
        );

        let notices = chat.startup_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, SurfaceKind::Error);
        assert!(chat.is_degraded());

        let err = chat.handle_user_message("hi").await.unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_notices() {
        let chat = ChatSession::new(registry(), Arc::new(MockModel::echo()), Arc::new(NoOpLogger));

        let broken = MockToolSession::new().failing_list("spawn failed");
        let notice = chat.connect_provider("broken", Arc::new(broken)).await;
        assert_eq!(notice.kind, SurfaceKind::Error);
        assert!(!chat.registry().contains_provider("broken"));

        let ok = MockToolSession::new().with_tool("ping", MockBehavior::Succeed("pong".into()));
        let notice = chat.connect_provider("pinger", Arc::new(ok)).await;
        assert_eq!(notice.kind, SurfaceKind::Notice);
        assert!(notice.content.contains("**ping**"));

        chat.disconnect_provider("pinger");
        assert!(chat.registry().is_empty());
        let notice = chat.disconnect_provider("pinger");
        assert!(notice.content.contains("No provider named pinger"));
    }
}
