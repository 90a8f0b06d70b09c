//! Model reply types

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::tool::ToolCall;

/// What one model call produced
///
/// When the model returns both text and tool calls, the reply is a
/// `ToolCalls` variant carrying the text alongside; tool calls take
/// precedence for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelReply {
    /// Plain assistant text
    Text { content: String },
    /// One or more tool invocations, in emission order
    ToolCalls {
        calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

impl ModelReply {
    /// Create a text reply
    pub fn text(content: impl Into<String>) -> Self {
        ModelReply::Text {
            content: content.into(),
        }
    }

    /// Create a tool-call reply
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        ModelReply::ToolCalls {
            calls,
            content: None,
        }
    }

    /// Build a reply from the raw parts of an assistant message.
    ///
    /// An empty call list is treated as no tool calls at all.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            ModelReply::Text {
                content: content.unwrap_or_default(),
            }
        } else {
            ModelReply::ToolCalls { calls, content }
        }
    }

    pub fn is_tool_calls(&self) -> bool {
        matches!(self, ModelReply::ToolCalls { .. })
    }

    /// Convert into the assistant history entry for this reply
    pub fn to_message(&self) -> ChatMessage {
        match self {
            ModelReply::Text { content } => ChatMessage::assistant(content.clone()),
            ModelReply::ToolCalls { calls, content } => {
                ChatMessage::assistant_tool_calls(content.clone(), calls.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use serde_json::json;

    #[test]
    fn test_from_parts_prefers_tool_calls() {
        let reply = ModelReply::from_parts(
            Some("Let me look that up".to_string()),
            vec![ToolCall::new("c1", "list_postgres_tables", json!({}))],
        );
        assert!(reply.is_tool_calls());

        let text = ModelReply::from_parts(Some("Hello".to_string()), vec![]);
        assert_eq!(text, ModelReply::text("Hello"));
    }

    #[test]
    fn test_to_message() {
        let msg = ModelReply::tool_calls(vec![ToolCall::new("c1", "foo", json!({}))]).to_message();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.has_tool_calls());

        let msg = ModelReply::text("done").to_message();
        assert_eq!(msg.text(), Some("done"));
    }
}
