//! Model client trait definition

use async_trait::async_trait;

use crate::types::{ChatMessage, ModelReply, ToolDeclaration};
use super::error::ModelResult;

/// Sampling options for completion requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// The "model call" operation used by the conversation loop
///
/// Given the ordered history and the declared tools, the model answers with
/// either text or a list of tool invocations.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Client name used in logs and errors (e.g. "azure")
    fn name(&self) -> &str;

    /// Request one completion
    async fn complete(
        &self,
        history: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> ModelResult<ModelReply>;
}
