//! HS512 token signing and verification

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::entities::Claims;
use crate::errors::{DomainError, TokenError};

/// Signs claims into compact JWTs and verifies them back
///
/// Verification order is fixed: structure and header, then signature, then
/// claims parsing, then `exp > iat`, then expiry against the supplied `now`.
/// Expiry is never judged by the library so the injected clock stays
/// authoritative.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl TokenSigner {
    pub const ALGORITHM: Algorithm = Algorithm::HS512;

    /// Creates a signer over a shared secret
    pub fn new(secret: &[u8]) -> Result<Self, DomainError> {
        if secret.is_empty() {
            return Err(DomainError::configuration("signing secret must not be empty"));
        }

        let mut validation = Validation::new(Self::ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(Self::ALGORITHM),
            validation,
        })
    }

    /// Encodes claims into a signed token
    pub fn sign(&self, claims: &Claims) -> Result<String, DomainError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Verifies a token's signature and lifetime, returning its claims
    ///
    /// Any token type is accepted; callers check the type themselves.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        // A header naming another algorithm cannot be verified under this key
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        _ => TokenError::Malformed,
    }
}
