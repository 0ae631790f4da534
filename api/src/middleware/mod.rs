//! HTTP middleware
//!
//! - `auth` - edge authentication filter and the caller identity extractors

pub mod auth;

pub use auth::{AuthContext, EdgeAuth, OptionalAuth};
