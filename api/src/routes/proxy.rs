//! Forwarding of requests that passed the edge filter
//!
//! Anything without a local route is sent on to the configured upstream with
//! its method, path, query, body and end-to-end headers. The identity header
//! set by the filter travels with it.

use std::time::Duration;

use actix_web::{
    http::{
        header::{HeaderMap, HeaderName, HeaderValue},
        StatusCode,
    },
    web, HttpRequest, HttpResponse,
};

use crate::handlers::error_handler::error_response;
use crate::routes::AppState;

use tw_core::errors::DomainError;
use tw_core::repositories::TokenRepository;
use tw_shared::{error_codes, GatewayConfig};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that describe a single connection and are never forwarded
const HOP_BY_HOP: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Target of forwarded requests
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
}

impl Upstream {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DomainError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The upstream named in the gateway configuration, if any
    pub fn from_config(config: &GatewayConfig) -> Result<Option<Self>, DomainError> {
        config.upstream_url.as_deref().map(Self::new).transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn target_url(&self, req: &HttpRequest) -> String {
        match req.query_string() {
            "" => format!("{}{}", self.base_url, req.path()),
            query => format!("{}{}?{}", self.base_url, req.path(), query),
        }
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Default service: forward to the upstream or answer 404
pub async fn forward<R>(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState<R>>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
{
    let Some(upstream) = state.upstream.as_ref() else {
        return error_response(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "Resource not found");
    };

    match send(upstream, &req, body).await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Upstream request {} {} failed: {}", req.method(), req.path(), e);
            error_response(
                StatusCode::BAD_GATEWAY,
                error_codes::BAD_GATEWAY,
                "Upstream service unavailable",
            )
        }
    }
}

async fn send(
    upstream: &Upstream,
    req: &HttpRequest,
    body: web::Bytes,
) -> anyhow::Result<HttpResponse> {
    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())?;

    let mut outbound = upstream.client.request(method, upstream.target_url(req));
    for (name, value) in forwarded_headers(req.headers()) {
        outbound = outbound.header(name.as_str(), value.as_bytes());
    }

    let response = outbound.body(body.to_vec()).send().await?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    for (name, value) in response.headers() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            builder.append_header((name, value));
        }
    }

    let bytes = response.bytes().await?;
    Ok(builder.body(bytes.to_vec()))
}

fn forwarded_headers(headers: &HeaderMap) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
}
