//! Tool call dispatcher

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::logging::Logger;
use crate::tools::translate::normalize_arguments;
use crate::tools::{ResolvedTool, ToolRegistry};
use crate::types::{ChatMessage, ToolCall, ToolOutcome};

/// Per-call timeout applied when none is configured
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one dispatched tool call
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// ID of the call this outcome answers
    pub call_id: String,
    pub tool_name: String,
    /// Provider that handled the call, `None` when nothing resolved it
    pub provider: Option<String>,
    pub outcome: ToolOutcome,
}

impl DispatchOutcome {
    fn new(call: &ToolCall, provider: Option<String>, outcome: ToolOutcome) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            provider,
            outcome,
        }
    }

    /// The `tool` history entry for this outcome
    pub fn to_message(&self) -> ChatMessage {
        let content = match &self.outcome {
            ToolOutcome::Success { text } => text.clone(),
            ToolOutcome::Failure { message } => format!("Error executing tool: {}", message),
        };
        ChatMessage::tool(self.call_id.clone(), content)
    }
}

/// Routes model-requested tool calls to provider sessions
///
/// Calls bound for different providers run concurrently. Calls bound for the
/// same provider run one at a time, in request order. Outcomes always come
/// back in request order, one per call.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    call_timeout: Option<Duration>,
    logger: Arc<dyn Logger>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            logger,
        }
    }

    /// Set the per-call timeout; `None` waits forever
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute a batch of tool calls.
    ///
    /// Never fails as a whole: unresolved tools, bad arguments, transport
    /// faults and timeouts all become `Failure` outcomes for their own call.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<DispatchOutcome> {
        let mut slots: Vec<Option<DispatchOutcome>> = vec![None; calls.len()];
        let mut groups: Vec<(ResolvedTool, Vec<usize>)> = Vec::new();

        for (index, call) in calls.iter().enumerate() {
            match self.registry.lookup(&call.name) {
                Some(target) => match groups.iter_mut().find(|(t, _)| t.provider == target.provider) {
                    Some((_, indices)) => indices.push(index),
                    None => groups.push((target, vec![index])),
                },
                None => {
                    self.logger.warn(&format!("[Dispatcher] No provider for tool '{}'", call.name));
                    slots[index] = Some(DispatchOutcome::new(
                        call,
                        None,
                        ToolOutcome::failure(format!("No provider for tool {}", call.name)),
                    ));
                }
            }
        }

        self.logger.debug(&format!(
            "[Dispatcher] Dispatching {} calls across {} providers",
            calls.len(),
            groups.len()
        ));

        let runs = groups
            .into_iter()
            .map(|(target, indices)| self.run_group(target, indices, calls));

        for finished in join_all(runs).await {
            for (index, outcome) in finished {
                slots[index] = Some(outcome);
            }
        }

        slots.into_iter().flatten().collect()
    }

    async fn run_group(
        &self,
        target: ResolvedTool,
        indices: Vec<usize>,
        calls: &[ToolCall],
    ) -> Vec<(usize, DispatchOutcome)> {
        let mut finished = Vec::with_capacity(indices.len());
        for index in indices {
            let call = &calls[index];
            let outcome = self.invoke(&target, call).await;
            finished.push((index, DispatchOutcome::new(call, Some(target.provider.clone()), outcome)));
        }
        finished
    }

    async fn invoke(&self, target: &ResolvedTool, call: &ToolCall) -> ToolOutcome {
        let arguments = match normalize_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(reason) => {
                self.logger.warn(&format!(
                    "[Dispatcher] Rejected arguments for '{}': {}",
                    call.name, reason
                ));
                return ToolOutcome::failure(format!(
                    "Invalid arguments for tool {}: {}",
                    call.name, reason
                ));
            }
        };

        // One call per session at a time, also across chat sessions.
        let _permit = target.gate.lock().await;

        self.logger.info(&format!(
            "[Dispatcher] Calling '{}' on '{}'",
            call.name, target.provider
        ));

        let pending = target.session.call_tool(&call.name, arguments);
        let result = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result,
                Err(_) => {
                    self.logger.warn(&format!(
                        "[Dispatcher] '{}' timed out after {:?}",
                        call.name, limit
                    ));
                    return ToolOutcome::failure(format!(
                        "Tool {} timed out after {:?}",
                        call.name, limit
                    ));
                }
            },
            None => pending.await,
        };

        match result {
            Ok(outcome) => {
                if !outcome.is_success() {
                    self.logger.info(&format!("[Dispatcher] '{}' reported a failure", call.name));
                }
                outcome
            }
            Err(e) => {
                self.logger.error(&format!("[Dispatcher] '{}' failed: {}", call.name, e));
                ToolOutcome::failure(e.to_string())
            }
        }
    }
}
