//! Shared connection pool lifecycle

use std::sync::Arc;

use mcpchat_core::logging::Logger;
use mcpchat_core::{log_info, log_warn};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::RwLock;

use crate::error::GatewayResult;
use crate::settings::ConnectionSettings;

struct PoolState {
    settings: ConnectionSettings,
    pool: Option<PgPool>,
}

/// Owns the single pool shared by every gateway operation
///
/// The pool is created on first use. Handles returned by [`pool`](Self::pool)
/// are cheap clones; a connection checked out from one always returns to it,
/// even after a [`reconnect`](Self::reconnect) swapped in a new pool.
pub struct PoolManager {
    state: RwLock<PoolState>,
    logger: Arc<dyn Logger>,
}

impl PoolManager {
    pub fn new(settings: ConnectionSettings, logger: Arc<dyn Logger>) -> Self {
        Self {
            state: RwLock::new(PoolState {
                settings,
                pool: None,
            }),
            logger,
        }
    }

    /// Whether the pool has been created
    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.pool.is_some()
    }

    pub async fn settings(&self) -> ConnectionSettings {
        self.state.read().await.settings.clone()
    }

    /// The shared pool, created on first call
    pub async fn pool(&self) -> GatewayResult<PgPool> {
        if let Some(pool) = self.state.read().await.pool.as_ref() {
            return Ok(pool.clone());
        }

        let mut state = self.state.write().await;
        if let Some(pool) = state.pool.as_ref() {
            return Ok(pool.clone());
        }

        let pool = self.create(&state.settings).await?;
        state.pool = Some(pool.clone());
        Ok(pool)
    }

    /// Replace the pool.
    ///
    /// The new pool is built before the old one is touched, so a failure
    /// leaves the current pool in place. The old pool is closed after the
    /// swap; acquisitions on it fail from then on.
    pub async fn reconnect(&self, settings: Option<ConnectionSettings>) -> GatewayResult<()> {
        let settings = match settings {
            Some(settings) => settings,
            None => self.settings().await,
        };
        let fresh = self.create(&settings).await?;

        let old = {
            let mut state = self.state.write().await;
            state.settings = settings;
            state.pool.replace(fresh)
        };

        if let Some(old) = old {
            log_info!(self.logger, "[PoolManager] Closing previous pool");
            old.close().await;
        }
        Ok(())
    }

    /// Close the pool; the next operation creates a new one
    pub async fn close(&self) {
        let old = self.state.write().await.pool.take();
        if let Some(old) = old {
            log_info!(self.logger, "[PoolManager] Closing pool");
            old.close().await;
        }
    }

    async fn create(&self, settings: &ConnectionSettings) -> GatewayResult<PgPool> {
        log_info!(
            self.logger,
            "[PoolManager] Creating pool for {} ({}..{} connections)",
            settings.target.redacted(),
            settings.pool.min_connections,
            settings.pool.max_connections
        );

        let options = settings.target.connect_options()?;
        let pool = PgPoolOptions::new()
            .min_connections(settings.pool.min_connections)
            .max_connections(settings.pool.max_connections)
            .acquire_timeout(settings.pool.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                log_warn!(self.logger, "[PoolManager] Pool creation failed: {}", e);
                e
            })?;

        log_info!(self.logger, "[PoolManager] PostgreSQL connection pool created successfully");
        Ok(pool)
    }
}
