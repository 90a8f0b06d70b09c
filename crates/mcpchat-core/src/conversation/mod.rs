//! Conversation state machine
//!
//! A [`ChatSession`] owns one history. Each user message runs a turn:
//!
//! ```text
//! AwaitingModel ──► NoToolCalls ──────────────────────────────► Resolved
//!       │
//!       └──► HasToolCalls ──► Dispatching ──┬──────────────────► Resolved   (Direct)
//!                                          └──► Summarizing ──► Resolved   (Summarized)
//! ```

mod history;
mod state;
mod chat;

pub use history::ConversationHistory;
pub use state::{PostToolPolicy, SurfaceKind, SurfacedMessage, TurnError, TurnReport, TurnResult, TurnState};
pub use chat::ChatSession;
