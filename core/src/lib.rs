//! # Tokenwarden Core
//!
//! Token lifecycle logic for the tokenwarden gateway.
//! This crate contains the token entities, HS512 signer, refresh token
//! repository contract and the token service state machine.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    Claims, RefreshToken, RefreshTokenState, SessionMetadata, TokenPair, TokenType,
};
pub use errors::{AuthError, DomainError, DomainResult, TokenError};
pub use repositories::{CredentialVerifier, InMemoryTokenRepository, TokenRepository};
pub use services::{
    hash_token, AccessTokenVerifier, CleanupResult, Clock, LocalAccessVerifier, ManualClock,
    SystemClock, TokenCleanupConfig, TokenCleanupService, TokenFactory, TokenService,
    TokenServiceConfig, TokenSigner,
};
