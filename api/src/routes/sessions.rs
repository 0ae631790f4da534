//! Session management for the authenticated caller

use actix_web::{web, HttpResponse};

use crate::dto::auth_dto::{LogoutAllResponse, SessionInfoResponse};
use crate::handlers::handle_domain_error;
use crate::middleware::AuthContext;
use crate::routes::AppState;

use tw_core::repositories::TokenRepository;

/// Handler for POST /api/v1/sessions/logout-all
///
/// Revokes every refresh token of the caller. Access tokens already handed
/// out keep working until they expire.
///
/// ## Success (200 OK)
/// ```json
/// { "revoked": 3 }
/// ```
pub async fn logout_all<R>(state: web::Data<AppState<R>>, auth: AuthContext) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    match state.token_service.revoke_all_tokens(&auth.subject).await {
        Ok(revoked) => HttpResponse::Ok().json(LogoutAllResponse { revoked }),
        Err(error) => handle_domain_error(error),
    }
}

/// Handler for GET /api/v1/sessions/me
///
/// ## Success (200 OK)
/// ```json
/// { "subject": "alice", "activeSessions": 2 }
/// ```
pub async fn me<R>(state: web::Data<AppState<R>>, auth: AuthContext) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    match state.token_service.active_session_count(&auth.subject).await {
        Ok(active_sessions) => HttpResponse::Ok().json(SessionInfoResponse {
            subject: auth.subject,
            active_sessions,
        }),
        Err(error) => handle_domain_error(error),
    }
}
