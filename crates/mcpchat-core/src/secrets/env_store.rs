//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Logical keys and the variables that may hold them, in priority order
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("azure", vec!["AZURE_OPENAI_API_KEY"]);
    m.insert("postgres", vec!["DATABASE_URL", "MCP_POSTGRES_URL"]);
    m.insert("postgres_password", vec!["PGPASSWORD", "POSTGRES_PASSWORD"]);
    m
});

/// Read-only store over the process environment
///
/// Keys are looked up as variable names first, then through the logical key
/// table (`azure` → `AZURE_OPENAI_API_KEY`, `postgres` → `DATABASE_URL` or
/// `MCP_POSTGRES_URL`). Empty variables count as unset.
///
/// Load `.env` files (e.g. with dotenvy) before resolving configuration.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Variables consulted for a logical key
    pub fn env_vars_for(key: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(key.to_lowercase().as_str()).map(|v| v.as_slice())
    }

    fn read(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::read(key) {
            return Some(value);
        }

        Self::env_vars_for(key)?
            .iter()
            .find_map(|name| Self::read(name))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}
