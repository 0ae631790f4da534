//! HTTP routes
//!
//! - `auth` - login, refresh and logout (public)
//! - `sessions` - session management for the authenticated caller
//! - `proxy` - forwarding of everything else to the upstream service

pub mod auth;
pub mod proxy;
pub mod sessions;

use std::sync::Arc;

use actix_web::web;

use tw_core::repositories::{CredentialVerifier, TokenRepository};
use tw_core::services::TokenService;

pub use proxy::Upstream;

/// Application state shared by all handlers
pub struct AppState<R: TokenRepository> {
    pub token_service: Arc<TokenService<R>>,
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Where requests without a local route go, if anywhere
    pub upstream: Option<Upstream>,
}

impl<R: TokenRepository> AppState<R> {
    pub fn new(
        token_service: Arc<TokenService<R>>,
        credentials: Arc<dyn CredentialVerifier>,
        upstream: Option<Upstream>,
    ) -> Self {
        Self {
            token_service,
            credentials,
            upstream,
        }
    }
}

/// Mount the `/api/v1` routes
pub fn configure<R: TokenRepository + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(auth::login::<R>))
            .route("/refresh", web::post().to(auth::refresh_token::<R>))
            .route("/logout", web::post().to(auth::logout::<R>)),
    )
    .service(
        web::scope("/sessions")
            .route("/logout-all", web::post().to(sessions::logout_all::<R>))
            .route("/me", web::get().to(sessions::me::<R>)),
    );
}
