//! Domain entities for the token lifecycle.

pub mod token;

pub use token::{Claims, RefreshToken, RefreshTokenState, SessionMetadata, TokenPair, TokenType};
