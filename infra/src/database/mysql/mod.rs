//! MySQL repository implementations

mod credential_verifier_impl;
mod token_repository_impl;

pub use credential_verifier_impl::MySqlCredentialVerifier;
pub use token_repository_impl::MySqlTokenRepository;
