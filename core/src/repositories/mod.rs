pub mod credentials;
pub mod token;

pub use credentials::CredentialVerifier;
pub use token::{InMemoryTokenRepository, TokenRepository};
