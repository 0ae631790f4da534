//! Token signing and lifetime configuration

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{parsed_or, required, required_parsed};
use crate::errors::ConfigError;

/// Secrets shorter than this produce a startup warning
pub const MIN_RECOMMENDED_SECRET_BYTES: usize = 32;

/// JWT signing configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared HMAC secret used for both signing and verification
    #[serde(skip_serializing)]
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl_seconds: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_seconds: i64,

    /// Issue a fresh refresh token and revoke the presented one on every refresh
    #[serde(default)]
    pub rotate_refresh_tokens: bool,
}

impl JwtConfig {
    /// Build a configuration, rejecting empty secrets and non-positive TTLs
    pub fn new(
        secret: impl Into<String>,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_seconds: i64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            secret: secret.into(),
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            rotate_refresh_tokens: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `JWT_*` environment variables
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            secret: required(lookup, "JWT_SECRET")?,
            access_token_ttl_seconds: required_parsed(lookup, "JWT_ACCESS_TOKEN_TTL_SECONDS")?,
            refresh_token_ttl_seconds: required_parsed(lookup, "JWT_REFRESH_TOKEN_TTL_SECONDS")?,
            rotate_refresh_tokens: parsed_or(lookup, "JWT_ROTATE_REFRESH_TOKENS", false)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Enable refresh token rotation
    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotate_refresh_tokens = enabled;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET".to_string()));
        }
        if self.access_token_ttl_seconds <= 0 {
            return Err(ConfigError::invalid(
                "JWT_ACCESS_TOKEN_TTL_SECONDS",
                "must be greater than zero",
            ));
        }
        if self.refresh_token_ttl_seconds <= 0 {
            return Err(ConfigError::invalid(
                "JWT_REFRESH_TOKEN_TTL_SECONDS",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Non-fatal concerns about this configuration
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.secret.len() < MIN_RECOMMENDED_SECRET_BYTES {
            warnings.push(format!(
                "JWT_SECRET is shorter than {} bytes; use a longer random secret for HS512",
                MIN_RECOMMENDED_SECRET_BYTES
            ));
        }
        if self.access_token_ttl_seconds >= self.refresh_token_ttl_seconds {
            warnings.push(
                "access token TTL is not shorter than refresh token TTL".to_string(),
            );
        }
        warnings
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .finish()
    }
}

/// Schedule for the expired refresh token sweep
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Seconds between sweeps
    pub interval_seconds: u64,

    /// Whether the background sweep runs at all
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

impl CleanupConfig {
    /// Load from `TOKEN_CLEANUP_*` environment variables
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let interval_seconds =
            parsed_or(lookup, "TOKEN_CLEANUP_INTERVAL_SECONDS", defaults.interval_seconds)?;
        if interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "TOKEN_CLEANUP_INTERVAL_SECONDS",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            interval_seconds,
            enabled: parsed_or(lookup, "TOKEN_CLEANUP_ENABLED", defaults.enabled)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{lookup, minimal};

    #[test]
    fn test_jwt_config_from_lookup() {
        let config = JwtConfig::from_lookup(&lookup(&minimal())).unwrap();
        assert_eq!(config.access_token_ttl_seconds, 900);
        assert_eq!(config.refresh_token_ttl_seconds, 604800);
        assert!(!config.rotate_refresh_tokens);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_zero_or_negative_ttl_rejected() {
        assert!(matches!(
            JwtConfig::new("secret", 0, 60),
            Err(ConfigError::Invalid { ref key, .. }) if key == "JWT_ACCESS_TOKEN_TTL_SECONDS"
        ));
        assert!(matches!(
            JwtConfig::new("secret", 60, -5),
            Err(ConfigError::Invalid { ref key, .. }) if key == "JWT_REFRESH_TOKEN_TTL_SECONDS"
        ));
    }

    #[test]
    fn test_non_numeric_ttl_rejected() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "JWT_ACCESS_TOKEN_TTL_SECONDS");
        pairs.push(("JWT_ACCESS_TOKEN_TTL_SECONDS", "fifteen"));
        let err = JwtConfig::from_lookup(&lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            JwtConfig::new("", 60, 120).unwrap_err(),
            ConfigError::Missing("JWT_SECRET".to_string())
        );
    }

    #[test]
    fn test_warnings_for_short_secret_and_inverted_ttls() {
        let config = JwtConfig::new("short", 600, 300).unwrap();
        assert_eq!(config.warnings().len(), 2);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new("super-secret-value", 60, 120).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_cleanup_config_defaults_and_overrides() {
        let config = CleanupConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.interval_seconds, 3600);
        assert!(config.enabled);

        let config = CleanupConfig::from_lookup(&lookup(&[
            ("TOKEN_CLEANUP_INTERVAL_SECONDS", "60"),
            ("TOKEN_CLEANUP_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(config.interval_seconds, 60);
        assert!(!config.enabled);

        assert!(CleanupConfig::from_lookup(&lookup(&[("TOKEN_CLEANUP_INTERVAL_SECONDS", "0")]))
            .is_err());
    }
}
