//! Claim construction for access and refresh tokens

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::{Claims, TokenType};
use crate::errors::DomainError;

/// Longest lifetime accepted for either token type
const MAX_TTL_DAYS: i64 = 3650;

/// Builds claims with the configured lifetimes
#[derive(Debug, Clone)]
pub struct TokenFactory {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenFactory {
    /// Both lifetimes must be positive and at most ten years
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, DomainError> {
        check_ttl("access", access_ttl)?;
        check_ttl("refresh", refresh_ttl)?;
        Ok(Self {
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_seconds(access_secs: i64, refresh_secs: i64) -> Result<Self, DomainError> {
        let access = Duration::try_seconds(access_secs)
            .ok_or_else(|| DomainError::configuration("access token TTL out of range"))?;
        let refresh = Duration::try_seconds(refresh_secs)
            .ok_or_else(|| DomainError::configuration("refresh token TTL out of range"))?;
        Self::new(access, refresh)
    }

    pub fn build_access_claims(&self, subject: &str, now: DateTime<Utc>) -> Claims {
        Claims::new(subject, TokenType::Access, now, now + self.access_ttl)
    }

    pub fn build_refresh_claims(&self, subject: &str, now: DateTime<Utc>) -> Claims {
        Claims::new(subject, TokenType::Refresh, now, now + self.refresh_ttl)
    }

    /// Access token lifetime in whole seconds
    pub fn access_expires_in(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Refresh token lifetime in whole seconds
    pub fn refresh_expires_in(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }
}

fn check_ttl(kind: &str, ttl: Duration) -> Result<(), DomainError> {
    if ttl <= Duration::zero() {
        return Err(DomainError::configuration(format!(
            "{} token TTL must be greater than zero",
            kind
        )));
    }
    if ttl > Duration::days(MAX_TTL_DAYS) {
        return Err(DomainError::configuration(format!(
            "{} token TTL must not exceed {} days",
            kind, MAX_TTL_DAYS
        )));
    }
    if ttl.num_seconds() < 1 {
        return Err(DomainError::configuration(format!(
            "{} token TTL must be at least one second",
            kind
        )));
    }
    Ok(())
}
