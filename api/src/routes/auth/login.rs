use actix_web::{http::header::USER_AGENT, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, TokenResponse};
use crate::handlers::{handle_domain_error, validation_failed};
use crate::routes::AppState;

use tw_core::domain::entities::SessionMetadata;
use tw_core::errors::AuthError;
use tw_core::repositories::TokenRepository;

/// Handler for POST /api/v1/auth/login
///
/// Checks the credentials and issues a token pair for the matching subject.
///
/// # Request Body
///
/// ```json
/// {
///     "username": "alice",
///     "password": "wonderland"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "accessToken": "eyJ...",
///     "refreshToken": "eyJ...",
///     "tokenType": "Bearer",
///     "expiresIn": 900,
///     "refreshExpiresIn": 604800
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Missing or oversized fields
/// - 401 Unauthorized: Unknown user or wrong password
/// - 503 Service Unavailable: Token store unreachable
pub async fn login<R>(
    req: HttpRequest,
    state: web::Data<AppState<R>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return validation_failed(&errors);
    }

    let subject = match state
        .credentials
        .authenticate(&request.username, &request.password)
        .await
    {
        Ok(Some(subject)) => subject,
        Ok(None) => return handle_domain_error(AuthError::InvalidCredentials.into()),
        Err(error) => return handle_domain_error(error),
    };

    match state
        .token_service
        .generate_tokens_with_metadata(&subject, session_metadata(&req))
        .await
    {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(error),
    }
}

/// Client details stored alongside the refresh token
fn session_metadata(req: &HttpRequest) -> SessionMetadata {
    let device_info = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(255).collect::<String>());
    let ip_address = req.connection_info().realip_remote_addr().map(str::to_string);
    SessionMetadata::new(device_info, ip_address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_session_metadata_from_request() {
        let req = TestRequest::default()
            .insert_header((USER_AGENT, "curl/8.0"))
            .peer_addr("10.1.2.3:4567".parse().unwrap())
            .to_http_request();

        let metadata = session_metadata(&req);
        assert_eq!(metadata.device_info.as_deref(), Some("curl/8.0"));
        assert_eq!(metadata.ip_address.as_deref(), Some("10.1.2.3"));
    }
}
