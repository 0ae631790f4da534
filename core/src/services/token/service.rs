//! Main token service implementation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::domain::entities::token::{
    Claims, RefreshToken, RefreshTokenState, SessionMetadata, TokenPair, TokenType,
};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::TokenRepository;
use crate::services::clock::{Clock, SystemClock};

use super::config::TokenServiceConfig;
use super::factory::TokenFactory;
use super::signer::TokenSigner;
use super::verifier::{check_access_token, LocalAccessVerifier};

/// Hex-encoded SHA-256 of a signed token, the key records are stored under
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Service for issuing, refreshing, validating and revoking tokens
///
/// Access tokens are stateless. Refresh tokens are backed by a record in
/// the repository that controls whether they can still be used.
pub struct TokenService<R: TokenRepository> {
    pub(crate) repository: R,
    signer: TokenSigner,
    factory: TokenFactory,
    clock: Arc<dyn Clock>,
    rotate_refresh_tokens: bool,
}

impl<R: TokenRepository> TokenService<R> {
    /// Creates a token service reading time from the system clock
    pub fn new(repository: R, config: TokenServiceConfig) -> Result<Self, DomainError> {
        Self::with_clock(repository, config, SystemClock::shared())
    }

    /// Creates a token service with an explicit time source
    ///
    /// # Errors
    ///
    /// [`DomainError::Configuration`] for an empty secret or a TTL that is
    /// not positive.
    pub fn with_clock(
        repository: R,
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let signer = TokenSigner::new(config.signing_secret.as_bytes())?;
        let factory = TokenFactory::from_seconds(
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        )?;

        Ok(Self {
            repository,
            signer,
            factory,
            clock,
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// A repository-free verifier sharing this service's key and clock
    pub fn local_verifier(&self) -> LocalAccessVerifier {
        LocalAccessVerifier::new(self.signer.clone(), Arc::clone(&self.clock))
    }

    /// Access token lifetime in seconds
    pub fn access_expires_in(&self) -> i64 {
        self.factory.access_expires_in()
    }

    /// Issues a new access/refresh pair and stores the refresh record
    pub async fn generate_tokens(&self, subject: &str) -> DomainResult<TokenPair> {
        self.generate_tokens_with_metadata(subject, SessionMetadata::default())
            .await
    }

    /// Issues a new pair, recording client details with the refresh token
    ///
    /// # Errors
    ///
    /// * [`DomainError::Validation`] - `subject` is empty
    /// * [`DomainError::Storage`] - the record could not be saved
    /// * [`DomainError::Internal`] - signing failed or the stored hash collided
    pub async fn generate_tokens_with_metadata(
        &self,
        subject: &str,
        metadata: SessionMetadata,
    ) -> DomainResult<TokenPair> {
        if subject.trim().is_empty() {
            return Err(DomainError::validation("subject must not be empty"));
        }

        let now = self.clock.now();
        let access_token = self.mint_access_token(subject, now)?;
        let (refresh_token, record) = self.issue_refresh_token(subject, &metadata, now).await?;

        info!("Issued token pair for subject {} (record {})", subject, record.id);

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.factory.access_expires_in(),
            record.seconds_remaining(now),
        ))
    }

    fn mint_access_token(&self, subject: &str, now: DateTime<Utc>) -> DomainResult<String> {
        let claims = self.factory.build_access_claims(subject, now);
        self.signer.sign(&claims)
    }

    async fn issue_refresh_token(
        &self,
        subject: &str,
        metadata: &SessionMetadata,
        now: DateTime<Utc>,
    ) -> DomainResult<(String, RefreshToken)> {
        let claims = self.factory.build_refresh_claims(subject, now);
        let token = self.signer.sign(&claims)?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| DomainError::internal("refresh token expiry out of range"))?;

        let record =
            RefreshToken::new(subject, hash_token(&token), expires_at, now).with_metadata(metadata);

        match self.repository.save_refresh_token(record).await {
            Ok(saved) => Ok((token, saved)),
            Err(DomainError::Conflict { message }) => {
                error!("Refresh token hash collision for subject {}: {}", subject, message);
                Err(DomainError::internal("failed to store refresh token"))
            }
            Err(e) => Err(e),
        }
    }

    /// Exchanges a refresh token for a new access token
    ///
    /// Checks run in order: signature and expiry of the token itself, its
    /// type, the stored record's existence, revocation, then record expiry.
    /// Without rotation the presented refresh token is returned unchanged.
    /// With rotation it is revoked and replaced; of two concurrent refreshes
    /// with the same token only one succeeds.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let now = self.clock.now();
        let record = self
            .check_refresh_token(refresh_token, now)
            .await
            .map_err(|e| log_rejection("refresh", e))?;

        let access_token = self.mint_access_token(&record.subject, now)?;

        if !self.rotate_refresh_tokens {
            debug!("Refreshed access token for subject {}", record.subject);
            return Ok(TokenPair::new(
                access_token,
                refresh_token.to_string(),
                self.factory.access_expires_in(),
                record.seconds_remaining(now),
            ));
        }

        // The replacement is stored before the old token is claimed, so a
        // failed save leaves the presented token usable for a retry
        let metadata = SessionMetadata::new(record.device_info.clone(), record.ip_address.clone());
        let (new_refresh, new_record) =
            self.issue_refresh_token(&record.subject, &metadata, now).await?;

        match self.repository.mark_revoked(&record.token_hash, now).await {
            Ok(true) => {}
            Ok(false) => {
                // A concurrent refresh claimed the old token first
                self.discard_replacement(&new_record, now).await;
                return Err(log_rejection("refresh", TokenError::RevokedToken.into()));
            }
            Err(e) => {
                self.discard_replacement(&new_record, now).await;
                return Err(e);
            }
        }

        info!(
            "Rotated refresh token for subject {} ({} -> {})",
            record.subject, record.id, new_record.id
        );

        Ok(TokenPair::new(
            access_token,
            new_refresh,
            self.factory.access_expires_in(),
            new_record.seconds_remaining(now),
        ))
    }

    /// Revoke a rotated-in record that was never handed out
    async fn discard_replacement(&self, record: &RefreshToken, now: DateTime<Utc>) {
        if let Err(e) = self.repository.mark_revoked(&record.token_hash, now).await {
            warn!(
                "Could not revoke unused refresh token {} for subject {}: {}",
                record.id, record.subject, e
            );
        }
    }

    async fn check_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<RefreshToken> {
        let claims = self.signer.verify(token, now)?;
        claims.expect_type(TokenType::Refresh)?;

        let record = self
            .repository
            .find_by_token(&hash_token(token))
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        match record.state_at(now) {
            RefreshTokenState::Issued => Ok(record),
            RefreshTokenState::Revoked => Err(TokenError::RevokedToken.into()),
            RefreshTokenState::Expired => Err(TokenError::Expired.into()),
        }
    }

    /// Verifies an access token without touching the repository
    pub fn validate_access_token(&self, token: &str) -> DomainResult<Claims> {
        check_access_token(&self.signer, token, self.clock.now()).map_err(DomainError::from)
    }

    /// Verifies a refresh token and returns its stored record
    pub async fn validate_refresh_token(&self, token: &str) -> DomainResult<RefreshToken> {
        self.check_refresh_token(token, self.clock.now()).await
    }

    /// Subject of any valid, unexpired token regardless of type
    pub fn get_subject_from_token(&self, token: &str) -> DomainResult<String> {
        let claims = self.signer.verify(token, self.clock.now())?;
        Ok(claims.sub)
    }

    /// Revokes a single refresh token
    ///
    /// Unknown or already-revoked tokens are not an error.
    pub async fn revoke_refresh_token(&self, token: &str) -> DomainResult<()> {
        let revoked = self
            .repository
            .mark_revoked(&hash_token(token), self.clock.now())
            .await?;
        if revoked {
            info!("Revoked refresh token");
        } else {
            debug!("Revocation requested for unknown or already revoked token");
        }
        Ok(())
    }

    /// Revokes every refresh token of a subject
    ///
    /// Each record is attempted independently. Returns the number newly
    /// revoked, or the first failure once every record has been attempted.
    pub async fn revoke_all_tokens(&self, subject: &str) -> DomainResult<usize> {
        let now = self.clock.now();
        let records = self.repository.find_all_by_subject(subject).await?;

        let mut revoked = 0;
        let mut first_error = None;
        for record in records.iter().filter(|r| !r.is_revoked) {
            match self.repository.mark_revoked(&record.token_hash, now).await {
                Ok(true) => revoked += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to revoke record {} for subject {}: {}", record.id, subject, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        info!("Revoked {} refresh tokens for subject {}", revoked, subject);

        match first_error {
            Some(e) => Err(e),
            None => Ok(revoked),
        }
    }

    /// Number of refresh tokens a subject can still use
    pub async fn active_session_count(&self, subject: &str) -> DomainResult<usize> {
        self.repository
            .count_active_by_subject(subject, self.clock.now())
            .await
    }

    /// Removes every refresh record for a subject
    pub async fn delete_all_tokens(&self, subject: &str) -> DomainResult<usize> {
        let deleted = self.repository.delete_all_by_subject(subject).await?;
        info!("Deleted {} refresh tokens for subject {}", deleted, subject);
        Ok(deleted)
    }

    /// Removes refresh records that are past their expiry
    pub async fn cleanup_expired_tokens(&self) -> DomainResult<usize> {
        self.repository.delete_expired(self.clock.now()).await
    }
}

fn log_rejection(operation: &str, err: DomainError) -> DomainError {
    match err.as_token_error() {
        Some(token_err) => debug!("{} rejected: {}", operation, token_err.reason()),
        None => warn!("{} failed: {}", operation, err),
    }
    err
}
