//! Shared fixtures for token service tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;
use crate::repositories::{InMemoryTokenRepository, TokenRepository};
use crate::services::clock::ManualClock;
use crate::services::token::{TokenService, TokenServiceConfig};

pub const SECRET: &str = "unit-test-secret-that-is-long-enough-for-hs512-signing";
pub const ACCESS_TTL: i64 = 900;
pub const REFRESH_TTL: i64 = 604_800;

pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn config() -> TokenServiceConfig {
    TokenServiceConfig::new(SECRET, ACCESS_TTL, REFRESH_TTL)
}

pub fn service_with(
    config: TokenServiceConfig,
) -> (
    TokenService<InMemoryTokenRepository>,
    InMemoryTokenRepository,
    Arc<ManualClock>,
) {
    let repo = InMemoryTokenRepository::new();
    let clock = Arc::new(ManualClock::new(epoch()));
    let service = TokenService::with_clock(repo.clone(), config, clock.clone()).unwrap();
    (service, repo, clock)
}

pub fn service() -> (
    TokenService<InMemoryTokenRepository>,
    InMemoryTokenRepository,
    Arc<ManualClock>,
) {
    service_with(config())
}

/// Replaces one character in the given dot-separated segment
pub fn tamper(token: &str, segment: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let target = &mut parts[segment];
    let mid = target.len() / 2;
    let original = target.as_bytes()[mid] as char;
    let replacement = if original == 'A' { 'B' } else { 'A' };
    target.replace_range(mid..mid + 1, &replacement.to_string());
    parts.join(".")
}

/// Repository wrapper that fails selected operations
#[derive(Clone, Default)]
pub struct FlakyRepository {
    pub inner: InMemoryTokenRepository,
    pub fail_find: Arc<Mutex<bool>>,
    pub fail_save: Arc<Mutex<bool>>,
    pub conflict_on_save: Arc<Mutex<bool>>,
    pub fail_revoke_for: Arc<Mutex<HashSet<String>>>,
    pub fail_delete_expired: Arc<Mutex<bool>>,
}

impl FlakyRepository {
    fn outage() -> DomainError {
        DomainError::storage("connection refused")
    }

    fn flag(flag: &Arc<Mutex<bool>>) -> bool {
        *flag.lock().unwrap()
    }
}

#[async_trait]
impl TokenRepository for FlakyRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        if Self::flag(&self.conflict_on_save) {
            return Err(DomainError::Conflict {
                message: "duplicate token_hash".to_string(),
            });
        }
        if Self::flag(&self.fail_save) {
            return Err(Self::outage());
        }
        self.inner.save_refresh_token(token).await
    }

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        if Self::flag(&self.fail_find) {
            return Err(Self::outage());
        }
        self.inner.find_by_token(token_hash).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all_by_subject(&self, subject: &str) -> Result<Vec<RefreshToken>, DomainError> {
        self.inner.find_all_by_subject(subject).await
    }

    async fn mark_revoked(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, DomainError> {
        if self.fail_revoke_for.lock().unwrap().contains(token_hash) {
            return Err(Self::outage());
        }
        self.inner.mark_revoked(token_hash, at).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        if Self::flag(&self.fail_delete_expired) {
            return Err(Self::outage());
        }
        self.inner.delete_expired(now).await
    }

    async fn delete_all_by_subject(&self, subject: &str) -> Result<usize, DomainError> {
        self.inner.delete_all_by_subject(subject).await
    }

    async fn count_active_by_subject(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        self.inner.count_active_by_subject(subject, now).await
    }
}

pub fn flaky_service() -> (TokenService<FlakyRepository>, FlakyRepository, Arc<ManualClock>) {
    flaky_service_with(config())
}

pub fn flaky_service_with(
    config: TokenServiceConfig,
) -> (TokenService<FlakyRepository>, FlakyRepository, Arc<ManualClock>) {
    let repo = FlakyRepository::default();
    let clock = Arc::new(ManualClock::new(epoch()));
    let service = TokenService::with_clock(repo.clone(), config, clock.clone()).unwrap();
    (service, repo, clock)
}
