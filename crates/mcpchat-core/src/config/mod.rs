//! Configuration
//!
//! - [`ConfigFile`]: the `llm`, `dispatch`, `database` and `mcp_servers` sections
//! - [`FileConfigProvider`]: YAML file at user or workspace level
//! - [`LlmSettings::resolve`]: merge file values with environment variables

mod error;
mod settings;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    CatalogSettings, ConfigFile, DatabaseSettings, DispatchSettings, LlmSettings,
    AZURE_API_KEY_VAR, AZURE_API_VERSION_VAR, AZURE_DEPLOYMENT_VAR, AZURE_ENDPOINT_VAR,
};
pub use file::{ConfigLevel, FileConfigProvider};
