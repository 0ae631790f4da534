//! Access token verification for request filters

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{Claims, TokenType};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::TokenRepository;
use crate::services::clock::{Clock, SystemClock};

use super::config::TokenServiceConfig;
use super::service::TokenService;
use super::signer::TokenSigner;

/// Verifies access tokens on the request path
///
/// Implementations never consult the token store.
pub trait AccessTokenVerifier: Send + Sync {
    fn verify_access_token(&self, token: &str) -> DomainResult<Claims>;
}

pub(crate) fn check_access_token(
    signer: &TokenSigner,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let claims = signer.verify(token, now)?;
    claims.expect_type(TokenType::Access)?;
    Ok(claims)
}

impl<R: TokenRepository> AccessTokenVerifier for TokenService<R> {
    fn verify_access_token(&self, token: &str) -> DomainResult<Claims> {
        self.validate_access_token(token)
    }
}

/// Access token verifier holding only the key and a clock
///
/// Suitable for an edge process that never issues tokens.
#[derive(Clone)]
pub struct LocalAccessVerifier {
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
}

impl LocalAccessVerifier {
    pub fn new(signer: TokenSigner, clock: Arc<dyn Clock>) -> Self {
        Self { signer, clock }
    }

    pub fn from_config(config: &TokenServiceConfig) -> DomainResult<Self> {
        let signer = TokenSigner::new(config.signing_secret.as_bytes())?;
        Ok(Self::new(signer, SystemClock::shared()))
    }
}

impl AccessTokenVerifier for LocalAccessVerifier {
    fn verify_access_token(&self, token: &str) -> DomainResult<Claims> {
        check_access_token(&self.signer, token, self.clock.now()).map_err(DomainError::from)
    }
}
