//! Mock tool session for testing
//!
//! Provides deterministic, scripted tool behavior without spawning a provider
//! process. Every call is recorded so tests can assert on ordering and on how
//! many calls overlapped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::types::{ToolDescriptor, ToolOutcome};

use super::error::{SessionError, SessionResult};
use super::traits::ToolSession;

/// Scripted behavior of one mock tool
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return a successful outcome with this text
    Succeed(String),
    /// Return a tool-level failure with this message
    Fail(String),
    /// Fail at the transport level
    Transport(String),
    /// Sleep, then succeed with this text
    Delayed { delay: Duration, text: String },
    /// Never answer
    Hang,
}

/// Scripted [`ToolSession`] implementation
#[derive(Debug, Default)]
pub struct MockToolSession {
    tools: Vec<ToolDescriptor>,
    behaviors: HashMap<String, MockBehavior>,
    list_error: Option<String>,
    calls: Mutex<Vec<(String, Value)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockToolSession {
    /// Create a session exposing no tools
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool with the given behavior
    pub fn with_tool(mut self, name: impl Into<String>, behavior: MockBehavior) -> Self {
        let name = name.into();
        self.tools
            .push(ToolDescriptor::new(name.clone(), format!("Mock tool {}", name)));
        self.behaviors.insert(name, behavior);
        self
    }

    /// Make `list_tools` fail with a transport error
    pub fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Names of the tools called so far, in arrival order
    pub fn called_tools(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run(&self, name: &str) -> SessionResult<ToolOutcome> {
        match self.behaviors.get(name) {
            None => Ok(ToolOutcome::failure(format!("Unknown tool: {}", name))),
            Some(MockBehavior::Succeed(text)) => Ok(ToolOutcome::success(text.clone())),
            Some(MockBehavior::Fail(message)) => Ok(ToolOutcome::failure(message.clone())),
            Some(MockBehavior::Transport(message)) => Err(SessionError::Transport(message.clone())),
            Some(MockBehavior::Delayed { delay, text }) => {
                tokio::time::sleep(*delay).await;
                Ok(ToolOutcome::success(text.clone()))
            }
            Some(MockBehavior::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ToolSession for MockToolSession {
    fn kind(&self) -> &str {
        "mock"
    }

    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        match &self.list_error {
            Some(message) => Err(SessionError::Transport(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> SessionResult<ToolOutcome> {
        self.calls.lock().push((name.to_string(), arguments));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.run(name).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_behaviors() {
        let session = MockToolSession::new()
            .with_tool("ok", MockBehavior::Succeed("fine".into()))
            .with_tool("bad", MockBehavior::Fail("no such table".into()))
            .with_tool("down", MockBehavior::Transport("pipe closed".into()));

        assert_eq!(session.list_tools().await.unwrap().len(), 3);
        assert_eq!(
            session.call_tool("ok", json!({})).await.unwrap(),
            ToolOutcome::success("fine")
        );
        assert_eq!(
            session.call_tool("bad", json!({})).await.unwrap(),
            ToolOutcome::failure("no such table")
        );
        assert!(session.call_tool("down", json!({})).await.is_err());
        assert_eq!(session.called_tools(), vec!["ok", "bad", "down"]);
        assert_eq!(session.max_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_failing_list() {
        let session = MockToolSession::new().failing_list("spawn failed");
        let err = session.list_tools().await.unwrap_err();
        assert_eq!(err, SessionError::Transport("spawn failed".into()));
    }
}
