//! Database configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MIN_IDLE, PoolConfig};

/// Errors raised when settings cannot produce a usable pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No database URL was supplied by any configuration layer.
    #[error("database url is not configured; set CALCULATIONS_DATABASE_URL")]
    MissingDatabaseUrl,
    /// The pool would never be allowed to open a connection.
    #[error("max connections must be at least 1")]
    ZeroMaxConnections,
}

/// Connection settings for the calculations database.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CALCULATIONS")]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Idle connections kept warm by the pool.
    pub min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    /// Return the configured pool size.
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Return the configured idle floor, falling back to the default.
    pub fn min_idle(&self) -> u32 {
        self.min_idle.unwrap_or(DEFAULT_MIN_IDLE)
    }

    /// Return the checkout timeout, falling back to the default.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout_secs
            .map_or(DEFAULT_CONNECTION_TIMEOUT, Duration::from_secs)
    }

    /// Build the pool configuration these settings describe.
    pub fn pool_config(&self) -> Result<PoolConfig, ConfigError> {
        let database_url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let max_size = self.max_connections();
        if max_size == 0 {
            return Err(ConfigError::ZeroMaxConnections);
        }
        Ok(PoolConfig::new(database_url)
            .with_max_size(max_size)
            .with_min_idle(Some(self.min_idle().min(max_size)))
            .with_connection_timeout(self.connection_timeout()))
    }
}
