use actix_web::{web, HttpResponse};

use crate::dto::auth_dto::{LogoutRequest, MessageResponse};
use crate::handlers::handle_domain_error;
use crate::routes::AppState;

use tw_core::repositories::TokenRepository;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the given refresh token. Unknown and already revoked tokens
/// succeed too, so the call can be repeated safely. The access token stays
/// valid until it expires.
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "Logged out successfully"
/// }
/// ```
///
/// ## Errors
/// - 503 Service Unavailable: Token store unreachable
pub async fn logout<R>(
    state: web::Data<AppState<R>>,
    request: web::Json<LogoutRequest>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    match state
        .token_service
        .revoke_refresh_token(&request.refresh_token)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
        Err(error) => handle_domain_error(error),
    }
}
