//! Turn states, policies and surfaced output

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::DispatchOutcome;
use crate::model::ModelError;

/// What happens after a round of tool calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostToolPolicy {
    /// Surface each tool result verbatim, no further model call
    Direct,
    /// Ask the model once more, without tools, and surface its answer
    #[default]
    Summarized,
}

/// States a turn passes through
///
/// `AwaitingModel → NoToolCalls → Resolved`, or
/// `AwaitingModel → HasToolCalls → Dispatching → [Summarizing →] Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModel,
    HasToolCalls,
    NoToolCalls,
    Dispatching,
    Summarizing,
    Resolved,
}

/// Kind of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Assistant,
    ToolResult,
    ToolFailure,
    Notice,
    Error,
}

/// A message the front-end should display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacedMessage {
    /// "assistant", a tool name, or "system"
    pub author: String,
    pub content: String,
    pub kind: SurfaceKind,
}

impl SurfacedMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            author: "assistant".to_string(),
            content: content.into(),
            kind: SurfaceKind::Assistant,
        }
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            author: "system".to_string(),
            content: content.into(),
            kind: SurfaceKind::Notice,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            author: "system".to_string(),
            content: content.into(),
            kind: SurfaceKind::Error,
        }
    }

    /// A tool result authored by the tool itself
    pub fn tool(outcome: &DispatchOutcome) -> Self {
        let kind = if outcome.outcome.is_success() {
            SurfaceKind::ToolResult
        } else {
            SurfaceKind::ToolFailure
        };
        Self {
            author: outcome.tool_name.clone(),
            content: outcome.outcome.text().to_string(),
            kind,
        }
    }
}

/// What one completed turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// Messages to display, in order
    pub replies: Vec<SurfacedMessage>,
    /// States visited, ending in `Resolved`
    pub path: Vec<TurnState>,
}

impl TurnReport {
    /// Content of the last reply, if any
    pub fn final_text(&self) -> Option<&str> {
        self.replies.last().map(|r| r.content.as_str())
    }
}

/// Why a turn was aborted
///
/// The chat session and its history survive every variant.
#[derive(Error, Debug)]
pub enum TurnError {
    /// The session started without a usable model configuration
    #[error("Configuration error: {0}")]
    NotConfigured(String),

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    /// The summarization reply asked for more tools
    #[error("The model requested {count} more tool calls while summarizing; they were not executed")]
    UnexpectedToolCalls { count: usize },
}

pub type TurnResult<T> = Result<T, TurnError>;
