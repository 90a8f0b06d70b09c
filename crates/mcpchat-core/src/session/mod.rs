//! Provider session adapter
//!
//! A [`ToolSession`] wraps one connection to an external tool provider. It
//! lists the provider's tools once at connect time and invokes them by name.
//!
//! Tool-level failures reported by the provider come back as
//! [`ToolOutcome::Failure`](crate::types::ToolOutcome) values. Only transport
//! faults (connection severed, malformed response) are returned as
//! [`SessionError`].

mod traits;
mod error;
mod mcp;
mod mock;

pub use traits::ToolSession;
pub use error::{SessionError, SessionResult};
pub use mcp::McpSession;
pub use mock::{MockBehavior, MockToolSession};
