//! Maps domain errors onto HTTP responses
//!
//! Token and credential failures all become the same 401 so clients cannot
//! tell a forged token from an expired one.

use actix_web::{error::InternalError, http::StatusCode, HttpRequest, HttpResponse};
use validator::ValidationErrors;

use tw_core::errors::DomainError;
use tw_shared::{error_codes, ErrorResponse};

pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    match error {
        DomainError::Token(token_error) => {
            log::debug!("Token rejected: {}", token_error.reason());
            unauthorized()
        }
        DomainError::Auth(auth_error) => {
            log::debug!("Authentication failed: {}", auth_error);
            unauthorized()
        }
        DomainError::Validation { message } => error_response(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            message,
        ),
        DomainError::Storage { message } => {
            log::error!("Token store unavailable: {}", message);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
        }
        other => {
            log::error!("Request failed: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "An internal error occurred",
            )
        }
    }
}

/// The uniform 401 response
pub fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse::unauthorized())
}

pub fn validation_failed(errors: &ValidationErrors) -> HttpResponse {
    let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
    fields.sort();
    error_response(
        StatusCode::BAD_REQUEST,
        error_codes::VALIDATION_ERROR,
        format!("Invalid fields: {}", fields.join(", ")),
    )
}

/// Rejects unparseable JSON bodies with the standard error shape
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let response = error_response(
        StatusCode::BAD_REQUEST,
        error_codes::BAD_REQUEST,
        format!("Invalid request body: {}", err),
    );
    InternalError::from_response(err, response).into()
}

pub fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(code, message))
}
