//! Mock model client for testing
//!
//! Plays back a scripted sequence of replies without network access and
//! records every request it receives. Once the script runs out it falls back
//! to the configured default mode.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::logging::{Logger, NoOpLogger};
use crate::types::{ChatMessage, MessageRole, ModelReply, ToolDeclaration};

use super::error::{ModelError, ModelResult};
use super::traits::ModelClient;

/// One scripted step
#[derive(Debug, Clone)]
pub enum MockStep {
    Reply(ModelReply),
    Fail(String),
}

/// What to do when the script is exhausted
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed text
    Fixed(String),
    /// Fail every request
    Error(String),
}

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub history: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Deterministic model client
pub struct MockModel {
    script: Mutex<VecDeque<MockStep>>,
    mode: MockMode,
    requests: Mutex<Vec<MockRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockModel {
    pub fn new(mode: MockMode) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            mode,
            requests: Mutex::new(Vec::new()),
            logger: Arc::new(NoOpLogger),
        }
    }

    /// Create an echo model
    pub fn echo() -> Self {
        Self::new(MockMode::Echo)
    }

    /// Create a model that always fails
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MockMode::Error(message.into()))
    }

    /// Create a model that plays `steps` in order, then echoes
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        let model = Self::echo();
        model.script.lock().extend(steps);
        model
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Queue a reply
    pub fn then_reply(self, reply: ModelReply) -> Self {
        self.script.lock().push_back(MockStep::Reply(reply));
        self
    }

    /// Queue a failure
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(MockStep::Fail(message.into()));
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(history: &[ChatMessage]) -> String {
        history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| m.text())
            .unwrap_or("(no message)")
            .to_string()
    }
}

#[async_trait]
impl ModelClient for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        history: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> ModelResult<ModelReply> {
        self.logger.debug(&format!(
            "[MockModel] Request: messages={}, tools={}",
            history.len(),
            tools.len()
        ));

        self.requests.lock().push(MockRequest {
            history: history.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        let step = self.script.lock().pop_front();
        match step {
            Some(MockStep::Reply(reply)) => Ok(reply),
            Some(MockStep::Fail(message)) => Err(ModelError::Other(message)),
            None => match &self.mode {
                MockMode::Echo => Ok(ModelReply::text(format!(
                    "Echo: {}",
                    Self::last_user_message(history)
                ))),
                MockMode::Fixed(text) => Ok(ModelReply::text(text.clone())),
                MockMode::Error(message) => Err(ModelError::Other(message.clone())),
            },
        }
    }
}
