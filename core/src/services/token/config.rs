//! Configuration for the token service

use std::fmt;

use tw_shared::JwtConfig;

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Shared HMAC signing secret
    pub signing_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_seconds: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_seconds: i64,
    /// Issue a new refresh token and revoke the old one on refresh
    pub rotate_refresh_tokens: bool,
}

impl TokenServiceConfig {
    pub fn new(
        signing_secret: impl Into<String>,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            rotate_refresh_tokens: false,
        }
    }

    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotate_refresh_tokens = enabled;
        self
    }
}

impl From<&JwtConfig> for TokenServiceConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            signing_secret: config.secret.clone(),
            access_token_ttl_seconds: config.access_token_ttl_seconds,
            refresh_token_ttl_seconds: config.refresh_token_ttl_seconds,
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }
}

impl fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("signing_secret", &"<redacted>")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .finish()
    }
}
