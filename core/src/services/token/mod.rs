//! Token service module
//!
//! This module handles the token lifecycle:
//! - HS512 signing and verification
//! - Access/refresh claim construction
//! - Refresh token issuance, refresh, and revocation
//! - Background cleanup of expired refresh tokens

mod cleanup;
mod config;
mod factory;
mod service;
mod signer;
mod verifier;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use factory::TokenFactory;
pub use service::{hash_token, TokenService};
pub use signer::TokenSigner;
pub use verifier::{AccessTokenVerifier, LocalAccessVerifier};
