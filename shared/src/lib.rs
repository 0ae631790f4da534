//! Shared configuration and common types for the Tokenwarden server
//!
//! This crate provides functionality used across all server crates:
//! - Configuration types loaded from the process environment
//! - Configuration errors
//! - The error response body returned by the HTTP layer

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CleanupConfig, DatabaseConfig, DevCredential, Environment, GatewayConfig,
    JwtConfig, ServerConfig, DEFAULT_IDENTITY_HEADER,
};
pub use errors::{error_codes, ConfigError, ErrorResponse};
