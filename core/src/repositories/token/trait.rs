//! Token repository trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

/// Repository trait for refresh token records
///
/// Records are keyed by `token_hash`, the hex SHA-256 of the signed token.
/// Implementations report backend failures as [`DomainError::Storage`].
///
/// # Example
/// ```no_run
/// # use chrono::{Duration, Utc};
/// # use tw_core::repositories::TokenRepository;
/// # use tw_core::domain::entities::RefreshToken;
/// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
/// let now = Utc::now();
/// let record = RefreshToken::new("alice", "9f86d081884c7d65", now + Duration::days(7), now);
/// repo.save_refresh_token(record).await?;
///
/// if let Some(found) = repo.find_by_token("9f86d081884c7d65").await? {
///     assert!(found.is_active_at(now));
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new record
    ///
    /// Returns [`DomainError::Conflict`] when a record with the same hash
    /// already exists.
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError>;

    /// Find a record by token hash
    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError>;

    /// All records for a subject, revoked and expired ones included
    async fn find_all_by_subject(&self, subject: &str) -> Result<Vec<RefreshToken>, DomainError>;

    /// Revoke the record with this hash
    ///
    /// Atomic with respect to concurrent callers: for a given record exactly
    /// one call observes `true`. Returns `false` when the record is unknown
    /// or already revoked.
    async fn mark_revoked(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Delete every record whose expiry is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Delete every record for a subject
    async fn delete_all_by_subject(&self, subject: &str) -> Result<usize, DomainError>;

    /// Count records that are neither revoked nor expired at `now`
    async fn count_active_by_subject(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError>;
}
