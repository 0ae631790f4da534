//! Credential verification seam used by the login route

use async_trait::async_trait;

use crate::errors::DomainError;

/// Checks a username/password pair against some credential source
///
/// Returns the subject to issue tokens for, or `None` when the pair does
/// not match. Unknown users and wrong passwords are indistinguishable.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<Option<String>, DomainError>;
}
