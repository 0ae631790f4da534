//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - Token signing and lifetime configuration, expiry sweep schedule
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and development-only settings
//! - `gateway` - Edge filter allowlist, identity header and upstream
//! - `server` - HTTP server bind configuration
//!
//! Every loader has a `from_lookup` form that reads values through a closure,
//! so tests can feed a map instead of touching the process environment.

pub mod auth;
pub mod database;
pub mod environment;
pub mod gateway;
pub mod server;

use std::str::FromStr;

use crate::errors::ConfigError;

// Re-export commonly used types
pub use auth::{CleanupConfig, JwtConfig};
pub use database::DatabaseConfig;
pub use environment::{DevCredential, Environment};
pub use gateway::{GatewayConfig, DEFAULT_IDENTITY_HEADER};
pub use server::ServerConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// Expired refresh token sweep schedule
    pub cleanup: CleanupConfig,

    /// Edge filter configuration
    pub gateway: GatewayConfig,

    /// Seed users for the in-memory credential store (development only)
    pub dev_credentials: Vec<DevCredential>,
}

impl AppConfig {
    /// Load the full configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the full configuration through a key lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup)?;
        let dev_credentials = if environment.is_development() {
            environment::parse_dev_credentials(&lookup)?
        } else {
            Vec::new()
        };

        Ok(Self {
            environment,
            server: ServerConfig::from_lookup(&lookup)?,
            database: DatabaseConfig::from_lookup(&lookup)?,
            jwt: JwtConfig::from_lookup(&lookup)?,
            cleanup: CleanupConfig::from_lookup(&lookup)?,
            gateway: GatewayConfig::from_lookup(&lookup)?,
            dev_credentials,
        })
    }

    /// Non-fatal configuration concerns worth logging at startup
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.jwt.warnings();
        if self.environment.is_production() && self.database.url.is_none() {
            warnings.push(
                "DATABASE_URL is not set; refresh tokens are kept in memory and lost on restart"
                    .to_string(),
            );
        }
        warnings
    }
}

/// Read a value that must be present
pub(crate) fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Parse a value that must be present
pub(crate) fn required_parsed<F, T>(lookup: &F, key: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required(lookup, key)?;
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

/// Parse an optional value, falling back to `default` when absent
pub(crate) fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        None => Ok(default),
    }
}
