//! MySQL-backed credential lookup for the login route

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};

use tw_core::errors::DomainError;
use tw_core::repositories::CredentialVerifier;

/// Verifies passwords against bcrypt hashes in `user_credentials`
#[derive(Clone)]
pub struct MySqlCredentialVerifier {
    pool: MySqlPool,
}

impl MySqlCredentialVerifier {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialVerifier for MySqlCredentialVerifier {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, DomainError> {
        let row = sqlx::query(
            "SELECT subject, password_hash FROM user_credentials WHERE username = ? LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Credential lookup failed: {}", e);
            DomainError::storage(format!("Failed to look up credentials: {}", e))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let subject: String = row
            .try_get("subject")
            .map_err(|e| DomainError::internal(format!("Failed to get subject: {}", e)))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| DomainError::internal(format!("Failed to get password_hash: {}", e)))?;

        let matches = crate::credentials::verify_password(password, password_hash).await?;
        Ok(matches.then_some(subject))
    }
}
