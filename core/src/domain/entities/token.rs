//! Token entities for the access/refresh token lifecycle.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TokenError;

/// Discriminates the two kinds of signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer credential presented on every request
    Access,
    /// Long-lived credential exchanged for new access tokens
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims structure for the JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier
    pub sub: String,

    /// Token kind, serialized as the `type` claim
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Creates claims for `subject` valid from `issued_at` until `expires_at`
    ///
    /// Both instants are truncated to whole seconds.
    pub fn new(
        subject: impl Into<String>,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.into(),
            token_type,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// A token is expired once `now` reaches `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Rejects claims of any type other than `expected`
    pub fn expect_type(&self, expected: TokenType) -> Result<(), TokenError> {
        if self.token_type == expected {
            Ok(())
        } else {
            Err(TokenError::WrongType {
                expected,
                actual: self.token_type,
            })
        }
    }
}

/// Optional client details recorded with a refresh token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

impl SessionMetadata {
    pub fn new(device_info: Option<String>, ip_address: Option<String>) -> Self {
        Self {
            device_info,
            ip_address,
        }
    }
}

/// Lifecycle state of a stored refresh token
///
/// `Issued` is the only state from which a refresh can succeed. `Revoked`
/// and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Issued,
    Revoked,
    Expired,
}

/// Refresh token record kept by the token store
///
/// Only the SHA-256 digest of the signed token is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Hex-encoded SHA-256 of the signed token
    pub token_hash: String,

    /// Subject the token was issued to
    pub subject: String,

    /// Instant after which the token can no longer be used
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked
    pub is_revoked: bool,

    pub created_at: DateTime<Utc>,

    /// Set on every mutation (revocation)
    pub updated_at: Option<DateTime<Utc>>,

    pub device_info: Option<String>,

    pub ip_address: Option<String>,
}

impl RefreshToken {
    /// Creates a new, unrevoked record
    pub fn new(
        subject: impl Into<String>,
        token_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token_hash: token_hash.into(),
            subject: subject.into(),
            expires_at,
            is_revoked: false,
            created_at,
            updated_at: None,
            device_info: None,
            ip_address: None,
        }
    }

    /// Attaches client details to the record
    pub fn with_metadata(mut self, metadata: &SessionMetadata) -> Self {
        self.device_info = metadata.device_info.clone();
        self.ip_address = metadata.ip_address.clone();
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Neither revoked nor expired at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && !self.is_expired_at(now)
    }

    /// Current lifecycle state; revocation takes precedence over expiry
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.is_revoked {
            RefreshTokenState::Revoked
        } else if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Issued
        }
    }

    /// Marks the record revoked. Returns `false` if it already was.
    pub fn revoke(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.updated_at = Some(at);
        true
    }

    /// Whole seconds until expiry, zero once expired
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Remaining refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            refresh_expires_in,
        }
    }
}
