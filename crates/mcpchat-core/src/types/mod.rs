//! Core types shared by the orchestration layer
//!
//! This module contains the message, tool and reply types passed between the
//! registry, the dispatcher, model clients and tool sessions.

mod message;
mod tool;
mod reply;

pub use message::{ChatMessage, MessageRole};
pub use tool::{ToolCall, ToolDeclaration, ToolDescriptor, ToolOutcome};
pub use reply::ModelReply;
