//! Tool registry mapping tool names to provider sessions
//!
//! The ToolRegistry is the central component for:
//! - Tracking which provider exposes which tool
//! - Resolving a model-requested tool name to its provider session
//! - Filtering tools based on user preferences
//! - Producing the declarations offered to the model

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use crate::logging::Logger;
use crate::session::ToolSession;
use crate::types::{ToolDeclaration, ToolDescriptor};

use super::translate::to_declaration;

/// Information about a registered tool with its provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    pub input_schema: Value,
    /// Name of the provider exposing this tool
    pub provider: String,
    /// Whether this tool is offered to the model
    pub enabled: bool,
}

impl ToolInfo {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Filter for tool listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolFilter {
    /// Only include enabled tools
    pub only_enabled: bool,
}

impl ToolFilter {
    /// Enabled tools only
    pub fn new() -> Self {
        Self { only_enabled: true }
    }

    /// Include all tools
    pub fn all() -> Self {
        Self { only_enabled: false }
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolInfo) -> bool {
        !self.only_enabled || tool.enabled
    }
}

/// Dispatch target for one tool name
#[derive(Clone)]
pub struct ResolvedTool {
    /// Provider that exposes the tool
    pub provider: String,
    /// Session to invoke the tool on
    pub session: Arc<dyn ToolSession>,
    /// Serializes calls against `session`
    pub(crate) gate: Arc<AsyncMutex<()>>,
}

impl std::fmt::Debug for ResolvedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTool")
            .field("provider", &self.provider)
            .field("kind", &self.session.kind())
            .finish()
    }
}

struct ProviderEntry {
    name: String,
    session: Arc<dyn ToolSession>,
    tools: Vec<ToolDescriptor>,
    gate: Arc<AsyncMutex<()>>,
}

/// Registry of connected providers and the tools they expose
///
/// Providers are kept in registration order; re-registering a provider keeps
/// its position. Mutations take the write lock, so they never interleave with
/// a concurrent `resolve`.
pub struct ToolRegistry {
    providers: RwLock<Vec<ProviderEntry>>,
    /// User-configured enabled/disabled state
    tool_states: RwLock<HashMap<String, bool>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            tool_states: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Register `provider` with its session and tools.
    ///
    /// Replaces any prior entry for the same provider and returns the session
    /// it held.
    pub fn register(
        &self,
        provider: impl Into<String>,
        session: Arc<dyn ToolSession>,
        tools: Vec<ToolDescriptor>,
    ) -> Option<Arc<dyn ToolSession>> {
        let provider = provider.into();
        let mut providers = self.providers.write();

        for entry in providers.iter().filter(|e| e.name != provider) {
            for tool in &tools {
                if entry.tools.iter().any(|t| t.name == tool.name) {
                    self.logger.warn(&format!(
                        "[ToolRegistry] Tool '{}' from '{}' collides with provider '{}'; calls resolve to '{}'",
                        tool.name, provider, entry.name, entry.name
                    ));
                }
            }
        }

        self.logger.info(&format!(
            "[ToolRegistry] Registered {} tools from '{}'",
            tools.len(),
            provider
        ));

        // Calls still running on the same session hold its gate; keep it.
        let gate = providers
            .iter()
            .find(|e| e.name == provider && Arc::ptr_eq(&e.session, &session))
            .map(|e| Arc::clone(&e.gate))
            .unwrap_or_else(|| Arc::new(AsyncMutex::new(())));

        let entry = ProviderEntry {
            name: provider.clone(),
            session,
            tools,
            gate,
        };

        match providers.iter_mut().find(|e| e.name == provider) {
            Some(existing) => {
                let old = std::mem::replace(existing, entry);
                Some(old.session)
            }
            None => {
                providers.push(entry);
                None
            }
        }
    }

    /// Remove `provider` and all of its tools.
    ///
    /// Unknown providers are ignored. Calls already dispatched keep their own
    /// handle to the session and finish independently.
    pub fn unregister(&self, provider: &str) -> Option<Arc<dyn ToolSession>> {
        let mut providers = self.providers.write();
        let pos = providers.iter().position(|e| e.name == provider)?;
        let entry = providers.remove(pos);

        self.logger.info(&format!(
            "[ToolRegistry] Unregistered '{}' ({} tools)",
            provider,
            entry.tools.len()
        ));

        Some(entry.session)
    }

    /// Name of the provider exposing `tool`, first registered wins
    pub fn resolve(&self, tool: &str) -> Option<String> {
        self.lookup(tool).map(|r| r.provider)
    }

    /// Session and serialization gate for `tool`
    pub fn lookup(&self, tool: &str) -> Option<ResolvedTool> {
        self.providers
            .read()
            .iter()
            .find(|e| e.tools.iter().any(|t| t.name == tool))
            .map(|e| ResolvedTool {
                provider: e.name.clone(),
                session: Arc::clone(&e.session),
                gate: Arc::clone(&e.gate),
            })
    }

    /// Get tools matching a filter, in provider registration order
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolInfo> {
        let states = self.tool_states.read();
        self.providers
            .read()
            .iter()
            .flat_map(|e| {
                e.tools.iter().map(|t| ToolInfo {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    input_schema: t.input_schema.clone(),
                    provider: e.name.clone(),
                    enabled: states.get(&t.name).copied().unwrap_or(true),
                })
            })
            .filter(|t| filter.matches(t))
            .collect()
    }

    /// Declarations offered to the model (enabled tools only).
    ///
    /// A name exposed by several providers is declared once, by the provider
    /// `resolve` routes it to.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        let mut seen = HashSet::new();
        self.get_tools(&ToolFilter::all())
            .into_iter()
            .filter(|info| seen.insert(info.name.clone()))
            .filter(|info| info.enabled)
            .map(|info| to_declaration(&info.descriptor()))
            .collect()
    }

    /// Descriptors of one provider, if registered
    pub fn descriptors(&self, provider: &str) -> Option<Vec<ToolDescriptor>> {
        self.providers
            .read()
            .iter()
            .find(|e| e.name == provider)
            .map(|e| e.tools.clone())
    }

    /// Enable or disable a tool for subsequent model calls
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        self.tool_states.write().insert(name.to_string(), enabled);
    }

    /// Registered provider names, in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.read().iter().map(|e| e.name.clone()).collect()
    }

    pub fn contains_provider(&self, provider: &str) -> bool {
        self.providers.read().iter().any(|e| e.name == provider)
    }

    /// Get count of registered tools across all providers
    pub fn tool_count(&self) -> usize {
        self.providers.read().iter().map(|e| e.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{MemoryLogger, NoOpLogger};
    use crate::session::{MockBehavior, MockToolSession};

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(NoOpLogger))
    }

    fn session(tools: &[&str]) -> (Arc<dyn ToolSession>, Vec<ToolDescriptor>) {
        let mut mock = MockToolSession::new();
        for name in tools {
            mock = mock.with_tool(*name, MockBehavior::Succeed(format!("{} ok", name)));
        }
        let descriptors = tools
            .iter()
            .map(|n| ToolDescriptor::new(*n, format!("Tool {}", n)))
            .collect();
        (Arc::new(mock), descriptors)
    }

    #[test]
    fn test_register_resolve_unregister() {
        let registry = registry();
        let (s, d) = session(&["foo"]);
        registry.register("A", s, d);

        assert_eq!(registry.resolve("foo"), Some("A".to_string()));
        assert_eq!(registry.resolve("bar"), None);

        assert!(registry.unregister("A").is_some());
        assert_eq!(registry.resolve("foo"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = registry();
        let (s, d) = session(&["foo"]);
        registry.register("A", s, d);

        assert!(registry.unregister("ghost").is_none());
        assert_eq!(registry.provider_names(), vec!["A"]);
        assert_eq!(registry.tool_count(), 1);
    }

    #[test]
    fn test_register_replaces_prior_entry() {
        let registry = registry();
        let (s1, d1) = session(&["foo", "old_tool"]);
        let (s2, d2) = session(&["foo", "new_tool"]);
        let (s3, d3) = session(&["bar"]);

        assert!(registry.register("A", s1, d1).is_none());
        registry.register("B", s3, d3);
        assert!(registry.register("A", s2, d2).is_some());

        assert_eq!(registry.provider_names(), vec!["A", "B"]);
        assert_eq!(registry.resolve("old_tool"), None);
        assert_eq!(registry.resolve("new_tool"), Some("A".to_string()));
        assert_eq!(registry.tool_count(), 3);
    }

    #[test]
    fn test_collision_first_registered_wins() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(logger.clone());
        let (s1, d1) = session(&["query"]);
        let (s2, d2) = session(&["query"]);

        registry.register("first", s1, d1);
        registry.register("second", s2, d2);

        assert_eq!(registry.resolve("query"), Some("first".to_string()));
        assert!(logger.contains("collides"));
    }

    #[test]
    fn test_declarations_follow_registration_and_enabled_state() {
        let registry = registry();
        let (s1, d1) = session(&["foo"]);
        let (s2, d2) = session(&["bar", "baz"]);
        registry.register("A", s1, d1);
        registry.register("B", s2, d2);

        let names: Vec<String> = registry.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);

        registry.set_tool_enabled("bar", false);
        let names: Vec<String> = registry.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["foo", "baz"]);

        // Disabled tools are hidden from the model but still listed with ToolFilter::all
        assert_eq!(registry.get_tools(&ToolFilter::all()).len(), 3);
    }

    #[test]
    fn test_tool_filter_enabled_state() {
        let mut tool = ToolInfo {
            name: "execute_postgres_query".to_string(),
            description: "Run a SELECT".to_string(),
            input_schema: serde_json::json!({}),
            provider: "postgres".to_string(),
            enabled: true,
        };

        assert!(ToolFilter::new().matches(&tool));
        tool.enabled = false;
        assert!(!ToolFilter::new().matches(&tool));
        assert!(ToolFilter::all().matches(&tool));
    }

    #[test]
    fn test_colliding_name_declared_once() {
        let registry = registry();
        let (s1, mut d1) = session(&["query"]);
        d1[0].description = "first query".to_string();
        let (s2, mut d2) = session(&["query", "other"]);
        d2[0].description = "second query".to_string();
        registry.register("first", s1, d1);
        registry.register("second", s2, d2);

        let declarations = registry.declarations();
        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["query", "other"]);
        assert_eq!(declarations[0].description, "first query");
        assert_eq!(registry.resolve("query"), Some("first".to_string()));
    }

    #[test]
    fn test_reregistering_same_session_keeps_gate() {
        let registry = registry();
        let (s, d) = session(&["foo"]);
        registry.register("A", Arc::clone(&s), d.clone());
        let before = registry.lookup("foo").unwrap();

        registry.register("A", Arc::clone(&s), d);
        let after = registry.lookup("foo").unwrap();
        assert!(Arc::ptr_eq(&before.gate, &after.gate));

        let (other, d) = session(&["foo"]);
        registry.register("A", other, d);
        let replaced = registry.lookup("foo").unwrap();
        assert!(!Arc::ptr_eq(&before.gate, &replaced.gate));
    }
}
