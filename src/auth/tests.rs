//! Tests for the auth module

use super::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token source that counts calls and hands out numbered tokens
struct CountingSource {
    calls: AtomicU32,
    delay: Duration,
}

impl CountingSource {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay,
        }
    }
}

#[async_trait]
impl TokenSource for CountingSource {
    async fn fetch_token(&self) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }
}

#[tokio::test]
async fn test_exchange_sends_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TOKEN_ACCESS_PATH))
        .and(header("Authorization", "Basic refresh-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"authentication_token": "bearer-xyz"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exchange =
        RefreshTokenExchange::new(reqwest::Client::new(), &mock_server.uri(), "refresh-123");
    let token = exchange.fetch_token().await.unwrap();

    assert_eq!(token, "bearer-xyz");
    assert!(exchange.url().ends_with(TOKEN_ACCESS_PATH));
}

#[tokio::test]
async fn test_exchange_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TOKEN_ACCESS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad refresh token"))
        .mount(&mock_server)
        .await;

    let exchange = RefreshTokenExchange::new(reqwest::Client::new(), &mock_server.uri(), "nope");
    let err = exchange.fetch_token().await.unwrap_err();

    assert!(matches!(err, Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_exchange_missing_token_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TOKEN_ACCESS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {}
        })))
        .mount(&mock_server)
        .await;

    let exchange = RefreshTokenExchange::new(reqwest::Client::new(), &mock_server.uri(), "r");
    let err = exchange.fetch_token().await.unwrap_err();
    assert!(matches!(err, Error::TokenRefresh { .. }));
}

#[tokio::test]
async fn test_store_uses_initial_token() {
    let source = Arc::new(CountingSource::new(Duration::ZERO));
    let store = TokenStore::new(source.clone(), Some("seed".to_string()));

    assert_eq!(store.token().await.unwrap(), "seed");
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert!(!store.cached().await.unwrap().is_refreshed());
}

#[tokio::test]
async fn test_store_mints_when_empty() {
    let source = Arc::new(CountingSource::new(Duration::ZERO));
    let store = TokenStore::new(source.clone(), None);

    assert_eq!(store.current().await, None);
    assert_eq!(store.token().await.unwrap(), "token-1");
    assert_eq!(store.token().await.unwrap(), "token-1");
    assert_eq!(store.refresh_count(), 1);
}

#[tokio::test]
async fn test_refresh_if_stale_updates_shared_clones() {
    let source = Arc::new(CountingSource::new(Duration::ZERO));
    let store = TokenStore::new(source, Some("old".to_string()));
    let clone = store.clone();

    let fresh = store.refresh_if_stale("old").await.unwrap();

    assert_eq!(fresh, "token-1");
    assert_eq!(clone.current().await.as_deref(), Some("token-1"));
    assert!(clone.cached().await.unwrap().is_refreshed());
}

#[tokio::test]
async fn test_refresh_if_stale_skips_when_already_refreshed() {
    let source = Arc::new(CountingSource::new(Duration::ZERO));
    let store = TokenStore::new(source.clone(), Some("old".to_string()));

    store.replace("newer").await;
    let token = store.refresh_if_stale("old").await.unwrap();

    assert_eq!(token, "newer");
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_refresh_is_deduplicated() {
    let source = Arc::new(CountingSource::new(Duration::from_millis(20)));
    let store = TokenStore::new(source.clone(), Some("expired".to_string()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_if_stale("expired").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "token-1");
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.refresh_count(), 1);
}
