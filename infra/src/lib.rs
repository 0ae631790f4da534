//! # Infrastructure Layer
//!
//! Concrete adapters for the tokenwarden core:
//! - **Database**: MySQL refresh token store and credential lookup using SQLx
//! - **Credentials**: bcrypt-backed in-memory credential store for development

use tw_core::errors::DomainError;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// Credential verification backed by process memory
pub mod credentials;

pub use credentials::InMemoryCredentialVerifier;
pub use database::{DatabasePool, MySqlCredentialVerifier, MySqlTokenRepository, PoolStatistics};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Password hashing failure
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Config(message) => DomainError::Configuration { message },
            InfrastructureError::Database(e) => DomainError::storage(e.to_string()),
            other => DomainError::internal(other.to_string()),
        }
    }
}
