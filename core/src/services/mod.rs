//! Business services containing token lifecycle logic.

pub mod clock;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{
    hash_token, AccessTokenVerifier, CleanupResult, LocalAccessVerifier, TokenCleanupConfig,
    TokenCleanupService, TokenFactory, TokenService, TokenServiceConfig, TokenSigner,
};
