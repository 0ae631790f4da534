//! Edge authentication filter.
//!
//! Every request passes through [`EdgeAuth`]. Requests under a public path
//! prefix go straight through; everything else needs a valid access token in
//! `Authorization: Bearer <token>`. Rejections all look the same to the
//! client: a 401 with the fixed body from [`ErrorResponse::unauthorized`].
//! The actual reason is only logged.
//!
//! On success the subject is propagated two ways: an [`AuthContext`] in the
//! request extensions for in-process handlers, and the identity header for
//! whatever the request is forwarded to. A client-supplied identity header
//! is always removed first.
//!
//! Paths containing dot segments are refused outright, public or not. The
//! upstream URL parser would resolve them, so the path checked here must be
//! the path that is forwarded.

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header::{HeaderName, HeaderValue, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use tw_core::{
    domain::entities::Claims,
    errors::{DomainError, TokenError},
    services::AccessTokenVerifier,
};
use tw_shared::{ErrorResponse, GatewayConfig};

/// Identity of the caller, available to handlers behind the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Subject the access token was issued to
    pub subject: String,
    /// `jti` of the access token
    pub token_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            subject: claims.sub,
            token_id: claims.jti,
            expires_at,
        }
    }
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Only present when the request came through EdgeAuth on a protected path
        let context = req.extensions().get::<AuthContext>().cloned();
        ready(context.ok_or_else(|| {
            InternalError::from_response(
                "missing auth context",
                HttpResponse::Unauthorized().json(ErrorResponse::unauthorized()),
            )
            .into()
        }))
    }
}

/// Optional identity extractor for handlers that also serve public paths
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalAuth(req.extensions().get::<AuthContext>().cloned())))
    }
}

/// Edge authentication middleware factory
#[derive(Clone)]
pub struct EdgeAuth {
    inner: Arc<EdgeAuthInner>,
}

struct EdgeAuthInner {
    verifier: Arc<dyn AccessTokenVerifier>,
    public_paths: Vec<String>,
    identity_header: HeaderName,
}

impl EdgeAuth {
    /// Build the filter from the gateway configuration
    ///
    /// Fails when the configured identity header is not a valid header name.
    pub fn new(
        verifier: Arc<dyn AccessTokenVerifier>,
        config: &GatewayConfig,
    ) -> Result<Self, DomainError> {
        let identity_header =
            HeaderName::from_bytes(config.identity_header.as_bytes()).map_err(|e| {
                DomainError::configuration(format!(
                    "invalid identity header '{}': {}",
                    config.identity_header, e
                ))
            })?;

        Ok(Self {
            inner: Arc::new(EdgeAuthInner {
                verifier,
                public_paths: config.public_paths.clone(),
                identity_header,
            }),
        })
    }

    /// Whether `path` falls under one of the public prefixes
    pub fn is_public(&self, path: &str) -> bool {
        self.inner.is_public(path)
    }
}

impl EdgeAuthInner {
    fn is_public(&self, path: &str) -> bool {
        self.public_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Resolve the caller's identity or the reason they are refused
    fn authenticate(&self, req: &ServiceRequest) -> Result<(AuthContext, HeaderValue), &'static str> {
        let token = extract_bearer_token(req).ok_or("missing_bearer_token")?;

        let claims = self
            .verifier
            .verify_access_token(token)
            .map_err(|e| match e.as_token_error() {
                Some(token_err) => token_err.reason(),
                None => {
                    log::error!("Access token check failed unexpectedly: {}", e);
                    "verifier_error"
                }
            })?;

        let header_value =
            HeaderValue::from_str(&claims.sub).map_err(|_| TokenError::Malformed.reason())?;

        Ok((AuthContext::from_claims(claims), header_value))
    }
}

impl<S, B> Transform<S, ServiceRequest> for EdgeAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = EdgeAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(EdgeAuthMiddleware {
            service: Rc::new(service),
            inner: Arc::clone(&self.inner),
        }))
    }
}

/// Edge authentication middleware service
pub struct EdgeAuthMiddleware<S> {
    service: Rc<S>,
    inner: Arc<EdgeAuthInner>,
}

impl<S, B> Service<ServiceRequest> for EdgeAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            // Never trust an identity the client sent itself
            req.headers_mut().remove(&inner.identity_header);

            if has_dot_segment(req.path()) {
                return Ok(reject(req, "dot_segment_path"));
            }

            if inner.is_public(req.path()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            match inner.authenticate(&req) {
                Ok((context, header_value)) => {
                    log::debug!("Authenticated {} {} as {}", req.method(), req.path(), context.subject);
                    req.headers_mut()
                        .insert(inner.identity_header.clone(), header_value);
                    req.extensions_mut().insert(context);

                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(reason) => Ok(reject(req, reason)),
            }
        })
    }
}

fn reject<B>(req: ServiceRequest, reason: &str) -> ServiceResponse<EitherBody<B>> {
    log::warn!("Rejected {} {}: {}", req.method(), req.path(), reason);
    let response = HttpResponse::Unauthorized().json(ErrorResponse::unauthorized());
    req.into_response(response).map_into_right_body()
}

/// Whether the path has a `.` or `..` segment once percent-decoded
///
/// Backslashes count as separators. A path that does not decode to UTF-8
/// is treated as suspect too.
fn has_dot_segment(path: &str) -> bool {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded
            .split(['/', '\\'])
            .any(|segment| segment == "." || segment == ".."),
        Err(_) => true,
    }
}

/// Extracts the token from `Authorization: Bearer <token>`
///
/// The scheme must match exactly, followed by a single space and a
/// non-empty token.
fn extract_bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn bearer(value: &str) -> ServiceRequest {
        TestRequest::default()
            .insert_header((AUTHORIZATION, value))
            .to_srv_request()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        assert_eq!(extract_bearer_token(&bearer("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&bearer("bearer abc")), None);
        assert_eq!(extract_bearer_token(&bearer("Bearer")), None);
        assert_eq!(extract_bearer_token(&bearer("Bearer ")), None);
        assert_eq!(
            extract_bearer_token(&TestRequest::default().to_srv_request()),
            None
        );
    }

    #[test]
    fn test_dot_segments_are_detected() {
        assert!(has_dot_segment("/public/../private/y"));
        assert!(has_dot_segment("/public/%2e%2e/private/y"));
        assert!(has_dot_segment("/public/%2E./private/y"));
        assert!(has_dot_segment("/public/..%2fprivate"));
        assert!(has_dot_segment("/public\\..\\private"));
        assert!(has_dot_segment("/public/./x"));
        assert!(has_dot_segment("/public/%ff"));

        assert!(!has_dot_segment("/public/x"));
        assert!(!has_dot_segment("/files/archive..tar"));
        assert!(!has_dot_segment("/files/.well-known/x"));
    }
}
