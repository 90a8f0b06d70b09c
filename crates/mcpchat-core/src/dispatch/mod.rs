//! Tool call dispatch
//!
//! Resolves each model-requested call through the [`ToolRegistry`](crate::tools::ToolRegistry),
//! invokes the owning session and collects one outcome per call.

mod dispatcher;

pub use dispatcher::{DispatchOutcome, Dispatcher, DEFAULT_CALL_TIMEOUT};
