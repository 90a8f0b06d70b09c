//! Provider connect/disconnect hooks

use std::sync::Arc;

use crate::session::{SessionResult, ToolSession};
use crate::types::ToolDescriptor;

use super::registry::ToolRegistry;

/// Register a freshly connected provider.
///
/// Lists the session's tools once and registers them under `name`, replacing
/// any previous registration. When listing fails nothing is registered and
/// the error is returned for the caller to report.
pub async fn on_provider_connect(
    registry: &ToolRegistry,
    name: &str,
    session: Arc<dyn ToolSession>,
) -> SessionResult<Vec<ToolDescriptor>> {
    let tools = session.list_tools().await?;
    registry.register(name, session, tools.clone());
    Ok(tools)
}

/// Forget a provider and purge its tools.
///
/// Returns whether anything was removed; unknown names are a no-op.
pub fn on_provider_disconnect(registry: &ToolRegistry, name: &str) -> bool {
    registry.unregister(name).is_some()
}
