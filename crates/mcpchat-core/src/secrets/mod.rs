//! Secret storage
//!
//! - [`SecretStore`] trait
//! - [`EnvSecretStore`]: the process environment (after `.env` loading)
//! - [`MemorySecretStore`]: in-memory, for tests and overrides

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
