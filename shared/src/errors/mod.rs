//! Shared error types and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration at startup
///
/// Every variant is fatal for the process: the binary logs it and exits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Standard error response structure used across all API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Timestamp when the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ErrorResponse {
    /// Create a new error response stamped with the current time
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// The fixed body used for every authentication rejection.
    ///
    /// Carries no timestamp so that all rejections are byte-identical.
    pub fn unauthorized() -> Self {
        Self {
            error: error_codes::UNAUTHORIZED.to_string(),
            message: "Unauthorized".to_string(),
            timestamp: None,
        }
    }
}

/// Common error codes used across the application
pub mod error_codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const BAD_GATEWAY: &str = "BAD_GATEWAY";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_body_is_stable() {
        let a = serde_json::to_string(&ErrorResponse::unauthorized()).unwrap();
        let b = serde_json::to_string(&ErrorResponse::unauthorized()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, r#"{"error":"UNAUTHORIZED","message":"Unauthorized"}"#);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("JWT_SECRET".to_string());
        assert_eq!(err.to_string(), "missing required configuration value: JWT_SECRET");

        let err = ConfigError::invalid("SERVER_PORT", "not a number");
        assert_eq!(err.to_string(), "invalid value for SERVER_PORT: not a number");
    }
}
