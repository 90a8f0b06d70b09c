//! Translation between provider tool schemas and the model's
//! function-calling format
//!
//! All functions here are pure. Schemas are passed through untouched: no
//! coercion, no defaulting of missing arguments.

use rmcp::model::{CallToolResult, RawContent, Tool as McpTool};
use serde_json::{Map, Value};

use crate::types::{ToolDeclaration, ToolDescriptor, ToolOutcome};

/// Text used when a provider reports success without any content
pub const EMPTY_SUCCESS_TEXT: &str = "Tool executed successfully";

/// Convert a tool descriptor into a model function declaration
pub fn to_declaration(descriptor: &ToolDescriptor) -> ToolDeclaration {
    let parameters = match &descriptor.input_schema {
        Value::Null => empty_object_schema(),
        schema => schema.clone(),
    };

    ToolDeclaration {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        parameters,
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Parse the argument string emitted by the model.
///
/// An empty string means "no arguments". Text that is not valid JSON is kept
/// as a `Value::String` so the dispatcher can report it for that call alone.
pub fn parse_arguments(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Serialize an argument payload back into the model's wire string
pub fn arguments_to_wire(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

/// Normalize an argument payload for a tool call.
///
/// `null` becomes `{}`; anything else that is not a JSON object is rejected
/// with a human-readable reason.
pub fn normalize_arguments(arguments: &Value) -> Result<Value, String> {
    match arguments {
        Value::Object(_) => Ok(arguments.clone()),
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(raw) => Err(format!("arguments are not valid JSON: {}", raw)),
        other => Err(format!("expected a JSON object, got {}", other)),
    }
}

/// Convert an MCP tool listing entry into a descriptor
pub fn descriptor_from_mcp(tool: McpTool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Convert an MCP `tools/call` result into a tool outcome
pub fn outcome_from_mcp(result: &CallToolResult) -> ToolOutcome {
    let text = result
        .content
        .iter()
        .map(|c| match &c.raw {
            RawContent::Text(t) => t.text.clone(),
            _ => "[non-text content]".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        let message = if text.is_empty() {
            "Tool reported an error without details".to_string()
        } else {
            text
        };
        return ToolOutcome::failure(message);
    }

    if text.is_empty() {
        ToolOutcome::success(EMPTY_SUCCESS_TEXT)
    } else {
        ToolOutcome::success(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    #[test]
    fn test_declaration_passes_schema_through() {
        let schema = json!({
            "type": "object",
            "properties": {
                "table_name": { "type": "string", "description": "Name of the table" },
                "limit": { "type": "integer", "default": 100 }
            },
            "required": ["table_name"]
        });
        let descriptor = ToolDescriptor::new("query_postgres_table", "Query data").with_schema(schema.clone());

        let decl = to_declaration(&descriptor);
        assert_eq!(decl.name, "query_postgres_table");
        assert_eq!(decl.description, "Query data");
        assert_eq!(decl.parameters, schema);
    }

    #[test]
    fn test_declaration_fills_missing_schema() {
        let descriptor = ToolDescriptor::new("ping", "Ping").with_schema(Value::Null);
        assert_eq!(to_declaration(&descriptor).parameters["type"], "object");
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("  "), json!({}));
        assert_eq!(parse_arguments(r#"{"limit": 5}"#), json!({"limit": 5}));
        assert_eq!(parse_arguments("{limit: 5"), Value::String("{limit: 5".to_string()));
    }

    #[test]
    fn test_arguments_to_wire() {
        assert_eq!(arguments_to_wire(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(arguments_to_wire(&Value::Null), "{}");
        assert_eq!(arguments_to_wire(&Value::String("{broken".into())), "{broken");
    }

    #[test]
    fn test_normalize_arguments() {
        assert_eq!(normalize_arguments(&Value::Null).unwrap(), json!({}));
        assert!(normalize_arguments(&json!({"q": "SELECT 1"})).is_ok());
        assert!(normalize_arguments(&json!([1, 2])).is_err());
        assert!(normalize_arguments(&Value::String("{oops".into()))
            .unwrap_err()
            .contains("not valid JSON"));
    }

    #[test]
    fn test_outcome_from_mcp() {
        let ok = CallToolResult::success(vec![Content::text("line 1"), Content::text("line 2")]);
        assert_eq!(outcome_from_mcp(&ok), ToolOutcome::success("line 1\nline 2"));

        let empty = CallToolResult::success(vec![]);
        assert_eq!(outcome_from_mcp(&empty), ToolOutcome::success(EMPTY_SUCCESS_TEXT));

        let err = CallToolResult::error(vec![Content::text("table not found")]);
        assert_eq!(outcome_from_mcp(&err), ToolOutcome::failure("table not found"));
    }
}
