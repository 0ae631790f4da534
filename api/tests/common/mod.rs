//! Shared wiring for the HTTP integration tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use chrono::{TimeZone, Utc};

use tw_api::{AppState, EdgeAuth, Upstream};
use tw_core::repositories::InMemoryTokenRepository;
use tw_core::services::{AccessTokenVerifier, ManualClock, TokenService, TokenServiceConfig};
use tw_infra::InMemoryCredentialVerifier;
use tw_shared::{DevCredential, GatewayConfig};

pub const SECRET: &str = "api-test-secret-with-enough-bytes-for-hs512";
pub const ACCESS_TTL: i64 = 900;
pub const REFRESH_TTL: i64 = 604800;

pub struct TestContext {
    pub clock: Arc<ManualClock>,
    pub service: Arc<TokenService<InMemoryTokenRepository>>,
    pub state: web::Data<AppState<InMemoryTokenRepository>>,
    pub edge_auth: EdgeAuth,
}

pub fn gateway() -> GatewayConfig {
    GatewayConfig::new(["/health", "/api/v1/auth", "/public"])
}

pub fn context() -> TestContext {
    context_with(gateway(), false)
}

pub fn context_with(gateway: GatewayConfig, rotate: bool) -> TestContext {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    ));
    let config = TokenServiceConfig::new(SECRET, ACCESS_TTL, REFRESH_TTL).with_rotation(rotate);
    let service = Arc::new(
        TokenService::with_clock(InMemoryTokenRepository::new(), config, clock.clone()).unwrap(),
    );

    let credentials = InMemoryCredentialVerifier::with_cost(
        &[DevCredential {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
        }],
        4,
    )
    .unwrap();

    let upstream = Upstream::from_config(&gateway).unwrap();
    let verifier: Arc<dyn AccessTokenVerifier> = Arc::new(service.local_verifier());
    let edge_auth = EdgeAuth::new(verifier, &gateway).unwrap();

    let state = web::Data::new(AppState::new(
        Arc::clone(&service),
        Arc::new(credentials),
        upstream,
    ));

    TestContext {
        clock,
        service,
        state,
        edge_auth,
    }
}

/// Flip one character in the given segment (0 header, 1 payload, 2 signature)
pub fn tamper(token: &str, segment: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let target = &mut parts[segment];
    let mid = target.len() / 2;
    let replacement = if target.as_bytes()[mid] == b'A' { "B" } else { "A" };
    target.replace_range(mid..mid + 1, replacement);
    parts.join(".")
}
