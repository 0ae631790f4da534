use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::auth_dto::{RefreshRequest, TokenResponse};
use crate::handlers::{handle_domain_error, validation_failed};
use crate::routes::AppState;

use tw_core::repositories::TokenRepository;

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new access token. The refresh token in
/// the response is the same one unless rotation is enabled.
///
/// # Request Body
///
/// ```json
/// {
///     "refreshToken": "eyJ..."
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// Same body as login; `refreshExpiresIn` counts down the refresh token's
/// remaining lifetime.
///
/// ## Errors
/// - 401 Unauthorized: Invalid, expired, unknown or revoked refresh token
/// - 503 Service Unavailable: Token store unreachable
pub async fn refresh_token<R>(
    state: web::Data<AppState<R>>,
    request: web::Json<RefreshRequest>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return validation_failed(&errors);
    }

    match state
        .token_service
        .refresh_access_token(&request.refresh_token)
        .await
    {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(error),
    }
}
