//! Token and authentication error types
//!
//! Every variant here surfaces to HTTP clients as the same uniform 401.
//! The distinctions exist for logging and tests.

use thiserror::Error;

use crate::domain::entities::TokenType;

/// Reasons a presented token is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a decodable JWT, unparseable claims, or inconsistent timestamps
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature verification failed")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },

    /// Refresh token verified but has no record in the store
    #[error("Refresh token not found")]
    TokenNotFound,

    #[error("Refresh token revoked")]
    RevokedToken,
}

impl TokenError {
    /// Signature, structure, or type problems, as opposed to lifecycle ones
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed | TokenError::SignatureInvalid | TokenError::WrongType { .. }
        )
    }

    /// Stable reason code for log fields
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::WrongType { .. } => "wrong_type",
            TokenError::TokenNotFound => "not_found",
            TokenError::RevokedToken => "revoked",
        }
    }
}

/// Credential check failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}
