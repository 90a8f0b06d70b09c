//! Tool management module
//!
//! Tracks which provider exposes which tool and translates provider schemas
//! into the declarations offered to the model.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistry                               │
//! │                                             │
//! │  provider name ──► session + descriptors    │
//! │  resolve(tool) ──► provider (first wins)    │
//! │  declarations() ──► model function format   │
//! └─────────────────────────────────────────────┘
//!           │
//!           │ tools/list, tools/call
//!           ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ MCP server (stdio,   │  │ In-process provider  │
//! │ HTTP, Unix socket)   │  │ (e.g. Postgres)      │
//! └──────────────────────┘  └──────────────────────┘
//! ```

mod registry;
mod lifecycle;
pub mod translate;

pub use registry::{ResolvedTool, ToolFilter, ToolInfo, ToolRegistry};
pub use lifecycle::{on_provider_connect, on_provider_disconnect};
