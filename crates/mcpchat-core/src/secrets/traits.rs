//! Core traits and types for secret storage

use thiserror::Error;

/// Errors that can occur during secret store operations
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Store not available: {0}")]
    NotAvailable(String),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Source of credentials and connection variables
///
/// Configuration resolution reads every environment-style variable
/// (`AZURE_OPENAI_API_KEY`, `DATABASE_URL`, `PGPASSWORD`, ...) through a
/// store, so tests can substitute a [`MemorySecretStore`](super::MemorySecretStore)
/// for the process environment.
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Retrieve a secret by variable name or logical key (e.g. "azure")
    fn get(&self, key: &str) -> Option<String>;

    /// Store a secret; read-only stores return [`SecretStoreError::ReadOnly`]
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First non-empty value among `keys`
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.trim().is_empty())
    }
}
