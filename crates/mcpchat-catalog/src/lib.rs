//! OpenMetadata catalog access for mcpchat
//!
//! [`CatalogClient`] talks to the catalog's REST API with a bearer token,
//! logging in with username and password when no token is configured.
//! [`CatalogToolSession`] exposes table listing and lookup as an in-process
//! tool provider next to the PostgreSQL tools.
//!
//! ```rust,ignore
//! use mcpchat_catalog::{CatalogToolSession, PROVIDER_NAME};
//!
//! let session = CatalogToolSession::new(config.catalog.clone(), secrets, logger.clone());
//! chat.connect_provider(PROVIDER_NAME, Arc::new(session)).await;
//! ```

pub mod error;
pub mod settings;
pub mod client;
pub mod format;
pub mod tools;

pub use error::{CatalogError, CatalogResult};
pub use settings::{describe_environment, CatalogAuth, CatalogConnection};
pub use client::{CatalogClient, CatalogColumn, CatalogTable, LookupFailure, TableLookup};
pub use tools::{CatalogToolSession, PROVIDER_NAME};
