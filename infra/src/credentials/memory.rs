//! Development credential store seeded from configuration

use std::collections::HashMap;

use async_trait::async_trait;

use tw_core::errors::DomainError;
use tw_core::repositories::CredentialVerifier;
use tw_shared::DevCredential;

use crate::InfrastructureError;

/// Credential verifier holding bcrypt hashes in memory
///
/// The username doubles as the subject.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialVerifier {
    hashes: HashMap<String, String>,
}

impl InMemoryCredentialVerifier {
    /// Hash every credential with bcrypt's default cost
    pub fn new(credentials: &[DevCredential]) -> Result<Self, InfrastructureError> {
        Self::with_cost(credentials, bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(credentials: &[DevCredential], cost: u32) -> Result<Self, InfrastructureError> {
        let mut hashes = HashMap::with_capacity(credentials.len());
        for credential in credentials {
            let hash = bcrypt::hash(&credential.password, cost)?;
            hashes.insert(credential.username.clone(), hash);
        }
        tracing::info!("Loaded {} development credentials", hashes.len());
        Ok(Self { hashes })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentialVerifier {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, DomainError> {
        let Some(hash) = self.hashes.get(username) else {
            return Ok(None);
        };

        let matches = super::verify_password(password, hash.clone()).await?;
        Ok(matches.then(|| username.to_string()))
    }
}
