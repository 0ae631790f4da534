//! Unit tests for the in-memory token repository

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;
use crate::repositories::token::{InMemoryTokenRepository, TokenRepository};

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn record(subject: &str, hash: &str, ttl_secs: i64) -> RefreshToken {
    RefreshToken::new(subject, hash, epoch() + Duration::seconds(ttl_secs), epoch())
}

#[tokio::test]
async fn test_save_and_find_refresh_token() {
    let repo = InMemoryTokenRepository::new();
    let token = record("alice", "hash-1", 3600);

    let saved = repo.save_refresh_token(token.clone()).await.unwrap();
    assert_eq!(saved.id, token.id);

    let found = repo.find_by_token("hash-1").await.unwrap().unwrap();
    assert_eq!(found, token);

    let by_id = repo.find_by_id(token.id).await.unwrap().unwrap();
    assert_eq!(by_id.token_hash, "hash-1");

    assert!(repo.find_by_token("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_hash_is_conflict() {
    let repo = InMemoryTokenRepository::new();
    repo.save_refresh_token(record("alice", "same", 60)).await.unwrap();

    let err = repo
        .save_refresh_token(record("bob", "same", 60))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict { .. }));
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_mark_revoked_reports_first_transition_only() {
    let repo = InMemoryTokenRepository::new();
    repo.save_refresh_token(record("alice", "h", 60)).await.unwrap();

    let at = epoch() + Duration::seconds(5);
    assert!(repo.mark_revoked("h", at).await.unwrap());
    assert!(!repo.mark_revoked("h", at).await.unwrap());
    assert!(!repo.mark_revoked("unknown", at).await.unwrap());

    let stored = repo.find_by_token("h").await.unwrap().unwrap();
    assert!(stored.is_revoked);
    assert_eq!(stored.updated_at, Some(at));
}

#[tokio::test]
async fn test_concurrent_revocation_has_single_winner() {
    let repo = Arc::new(InMemoryTokenRepository::new());
    repo.save_refresh_token(record("alice", "race", 60)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.mark_revoked("race", epoch()).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_delete_expired_uses_supplied_instant() {
    let repo = InMemoryTokenRepository::new();
    repo.save_refresh_token(record("alice", "short", 60)).await.unwrap();
    repo.save_refresh_token(record("alice", "long", 3600)).await.unwrap();

    assert_eq!(repo.delete_expired(epoch()).await.unwrap(), 0);
    // expiry exactly at `now` counts as expired
    assert_eq!(
        repo.delete_expired(epoch() + Duration::seconds(60)).await.unwrap(),
        1
    );
    assert!(repo.find_by_token("short").await.unwrap().is_none());
    assert!(repo.find_by_token("long").await.unwrap().is_some());
}

#[tokio::test]
async fn test_subject_queries() {
    let repo = InMemoryTokenRepository::new();
    repo.save_refresh_token(record("alice", "a1", 60)).await.unwrap();
    repo.save_refresh_token(record("alice", "a2", 3600)).await.unwrap();
    repo.save_refresh_token(record("alice", "a3", 3600)).await.unwrap();
    repo.save_refresh_token(record("bob", "b1", 3600)).await.unwrap();
    repo.mark_revoked("a3", epoch()).await.unwrap();

    assert_eq!(repo.find_all_by_subject("alice").await.unwrap().len(), 3);
    assert_eq!(
        repo.count_active_by_subject("alice", epoch()).await.unwrap(),
        2
    );
    assert_eq!(
        repo.count_active_by_subject("alice", epoch() + Duration::seconds(61))
            .await
            .unwrap(),
        1
    );

    assert_eq!(repo.delete_all_by_subject("alice").await.unwrap(), 3);
    assert!(repo.find_all_by_subject("alice").await.unwrap().is_empty());
    assert_eq!(repo.len().await, 1);
}
