//! Conversion between mcpchat types and the chat-completions wire format
//!
//! The wire format is the OpenAI chat-completions shape also served by Azure
//! OpenAI deployments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::translate::{arguments_to_wire, parse_arguments};
use crate::types::{ChatMessage, ModelReply, ToolCall, ToolDeclaration};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WireRequest {
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireChoice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireErrorBody {
    pub error: WireErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<Value>,
}

fn function_kind() -> String {
    "function".to_string()
}

// ============================================================================
// Request conversion: mcpchat -> wire
// ============================================================================

/// Convert one history entry to the wire format
pub fn to_wire_message(msg: &ChatMessage) -> WireMessage {
    let tool_calls = msg.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                kind: function_kind(),
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: arguments_to_wire(&call.arguments),
                },
            })
            .collect()
    });

    WireMessage {
        role: msg.role.to_string(),
        content: msg.content.clone(),
        tool_calls,
        tool_call_id: msg.tool_call_id.clone(),
    }
}

/// Convert the whole history
pub fn to_wire_messages(history: &[ChatMessage]) -> Vec<WireMessage> {
    history.iter().map(to_wire_message).collect()
}

/// Convert tool declarations to `{"type": "function", ...}` entries
pub fn to_wire_tools(tools: &[ToolDeclaration]) -> Vec<WireTool> {
    tools
        .iter()
        .map(|decl| WireTool {
            kind: "function",
            function: WireFunction {
                name: decl.name.clone(),
                description: decl.description.clone(),
                parameters: decl.parameters.clone(),
            },
        })
        .collect()
}

// ============================================================================
// Response conversion: wire -> mcpchat
// ============================================================================

/// Convert the assistant message of a completion into a reply
pub fn from_wire_message(msg: WireMessage) -> ModelReply {
    let calls = msg
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall::new(tc.id, tc.function.name, parse_arguments(&tc.function.arguments)))
        .collect();

    ModelReply::from_parts(msg.content, calls)
}
