//! End-to-end token lifecycle through the public API

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use tw_core::{
    AccessTokenVerifier, Clock, DomainError, InMemoryTokenRepository, ManualClock, TokenError,
    TokenService, TokenServiceConfig, TokenSigner, TokenType,
};

const SECRET: &str = "integration-secret-with-plenty-of-entropy-for-hs512";
const ACCESS_TTL: i64 = 300;
const REFRESH_TTL: i64 = 86_400;

fn setup() -> (TokenService<InMemoryTokenRepository>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.timestamp_opt(1_720_000_000, 0).unwrap(),
    ));
    let service = TokenService::with_clock(
        InMemoryTokenRepository::new(),
        TokenServiceConfig::new(SECRET, ACCESS_TTL, REFRESH_TTL),
        clock.clone(),
    )
    .unwrap();
    (service, clock)
}

fn flip_char(token: &str, index: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'x' { b'y' } else { b'x' };
    String::from_utf8(bytes).unwrap()
}

fn expect_token_error<T: std::fmt::Debug>(result: Result<T, DomainError>) -> TokenError {
    match result {
        Err(DomainError::Token(err)) => err,
        other => panic!("expected token error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_access_token_valid_for_many_subjects() {
    let (service, clock) = setup();

    for subject in ["u1", "550e8400-e29b-41d4-a716-446655440000", "user@example.com"] {
        let pair = service.generate_tokens(subject).await.unwrap();
        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    clock.advance(Duration::seconds(ACCESS_TTL - 1));
    let pair = service.generate_tokens("late").await.unwrap();
    assert!(service.validate_access_token(&pair.access_token).is_ok());
}

#[tokio::test]
async fn test_expired_then_refresh_scenario() {
    let (service, clock) = setup();

    let pair = service.generate_tokens("u1").await.unwrap();
    clock.advance(Duration::seconds(ACCESS_TTL + 1));

    assert_eq!(
        expect_token_error(service.validate_access_token(&pair.access_token)),
        TokenError::Expired
    );

    let refreshed = service.refresh_access_token(&pair.refresh_token).await.unwrap();
    let claims = service.validate_access_token(&refreshed.access_token).unwrap();
    assert_eq!(claims.sub, "u1");
}

#[tokio::test]
async fn test_expired_token_never_reports_signature_invalid() {
    let (service, clock) = setup();
    let pair = service.generate_tokens("u1").await.unwrap();

    clock.advance(Duration::days(365));

    assert_eq!(
        expect_token_error(service.validate_access_token(&pair.access_token)),
        TokenError::Expired
    );
    assert_eq!(
        expect_token_error(service.refresh_access_token(&pair.refresh_token).await),
        TokenError::Expired
    );
}

#[tokio::test]
async fn test_single_byte_alterations_fail_signature() {
    let (service, _clock) = setup();
    let pair = service.generate_tokens("u1").await.unwrap();
    let token = &pair.access_token;

    let first_dot = token.find('.').unwrap();
    let second_dot = token.rfind('.').unwrap();
    let payload_mid = (first_dot + second_dot) / 2;
    let signature_mid = (second_dot + token.len()) / 2;

    for index in [payload_mid, signature_mid] {
        let altered = flip_char(token, index);
        assert_eq!(
            expect_token_error(service.validate_access_token(&altered)),
            TokenError::SignatureInvalid,
            "altered index {index}"
        );
    }
}

#[tokio::test]
async fn test_revoke_all_blocks_every_refresh_token() {
    let (service, _clock) = setup();
    let sessions = [
        service.generate_tokens("u1").await.unwrap(),
        service.generate_tokens("u1").await.unwrap(),
        service.generate_tokens("u1").await.unwrap(),
    ];

    assert_eq!(service.revoke_all_tokens("u1").await.unwrap(), 3);

    for pair in &sessions {
        assert_eq!(
            expect_token_error(service.refresh_access_token(&pair.refresh_token).await),
            TokenError::RevokedToken
        );
    }
    // re-running is harmless
    assert_eq!(service.revoke_all_tokens("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_revocation_is_idempotent() {
    let (service, _clock) = setup();
    let pair = service.generate_tokens("u1").await.unwrap();

    service.revoke_refresh_token(&pair.refresh_token).await.unwrap();
    service.revoke_refresh_token(&pair.refresh_token).await.unwrap();
    service.revoke_refresh_token("eyJ.never.issued").await.unwrap();

    assert_eq!(
        expect_token_error(service.refresh_access_token(&pair.refresh_token).await),
        TokenError::RevokedToken
    );
}

#[tokio::test]
async fn test_concurrent_rotation_has_one_winner() {
    let clock = Arc::new(ManualClock::starting_now());
    let service = Arc::new(
        TokenService::with_clock(
            InMemoryTokenRepository::new(),
            TokenServiceConfig::new(SECRET, ACCESS_TTL, REFRESH_TTL).with_rotation(true),
            clock,
        )
        .unwrap(),
    );
    let pair = service.generate_tokens("u1").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let token = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move {
            service.refresh_access_token(&token).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(
                err.as_token_error(),
                Some(&TokenError::RevokedToken)
            ),
        }
    }
    assert_eq!(successes, 1);
    // Replacements minted by the losers are revoked again
    assert_eq!(service.active_session_count("u1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_token_from_other_key_is_rejected() {
    let (service, clock) = setup();
    let foreign = TokenSigner::new(b"some-other-deployment-secret-entirely-unrelated").unwrap();
    let claims = tw_core::TokenFactory::from_seconds(ACCESS_TTL, REFRESH_TTL)
        .unwrap()
        .build_access_claims("u1", clock.now());
    let token = foreign.sign(&claims).unwrap();

    assert_eq!(
        expect_token_error(service.verify_access_token(&token)),
        TokenError::SignatureInvalid
    );
}
