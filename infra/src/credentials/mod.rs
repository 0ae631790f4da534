//! Credential verification adapters

mod memory;

pub use memory::InMemoryCredentialVerifier;

use tw_core::errors::DomainError;

/// Checks `password` against a bcrypt hash off the async executor
pub(crate) async fn verify_password(password: &str, hash: String) -> Result<bool, DomainError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::internal(format!("Password check task failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            DomainError::internal("stored password hash is invalid")
        })
}
