//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared name, description and input schema of one callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique across all connected providers
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Function declaration in the model's function-calling format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call within its assistant turn
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Arguments payload
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Get an argument as a string
    pub fn get_arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get an argument as an i64
    pub fn get_arg_i64(&self, key: &str) -> Option<i64> {
        self.arguments.get(key).and_then(|v| v.as_i64())
    }
}

/// Result of one tool invocation as reported by its provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { text: String },
    Failure { message: String },
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(text: impl Into<String>) -> Self {
        ToolOutcome::Success { text: text.into() }
    }

    /// Create a failed outcome
    pub fn failure(message: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Text forwarded into the conversation for this outcome
    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success { text } => text,
            ToolOutcome::Failure { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_creation() {
        let tool = ToolDescriptor::new("query_postgres_table", "Query data from a table")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "table_name": { "type": "string" }
                },
                "required": ["table_name"]
            }));

        assert_eq!(tool.name, "query_postgres_table");
        assert_eq!(tool.input_schema["required"][0], "table_name");
    }

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall::new(
            "call_123",
            "query_postgres_table",
            json!({
                "table_name": "public.orders",
                "limit": 5
            }),
        );

        assert_eq!(call.get_arg_str("table_name"), Some("public.orders"));
        assert_eq!(call.get_arg_i64("limit"), Some(5));
        assert_eq!(call.get_arg_str("nonexistent"), None);
    }

    #[test]
    fn test_tool_outcome() {
        let ok = ToolOutcome::success("3 rows");
        assert!(ok.is_success());
        assert_eq!(ok.text(), "3 rows");

        let err = ToolOutcome::failure("relation does not exist");
        assert!(!err.is_success());
        assert_eq!(err.text(), "relation does not exist");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status\":\"failure\""));
    }
}
