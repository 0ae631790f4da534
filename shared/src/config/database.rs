//! Database configuration module

use serde::{Deserialize, Serialize};

use super::parsed_or;
use crate::errors::ConfigError;

/// Database configuration for the MySQL refresh token store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL; `None` selects the in-memory store
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    pub connect_timeout: u64,

    /// Apply bundled migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout: 30,
            run_migrations: default_run_migrations(),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Load from `DATABASE_*` environment variables
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            url: lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()),
            max_connections: parsed_or(lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            connect_timeout: parsed_or(lookup, "DATABASE_CONNECT_TIMEOUT", defaults.connect_timeout)?,
            run_migrations: parsed_or(lookup, "DATABASE_RUN_MIGRATIONS", defaults.run_migrations)?,
        })
    }
}

fn default_run_migrations() -> bool {
    true
}
