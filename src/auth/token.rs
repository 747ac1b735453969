//! Bearer token storage and refresh
//!
//! Handles minting bearer tokens from the refresh token and sharing the
//! current token between concurrent callers.

use super::types::{CachedToken, TokenResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Path of the refresh-token exchange endpoint
pub const TOKEN_ACCESS_PATH: &str = "/v3/security/token/access";

/// Something that can mint a new bearer token
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a fresh bearer token
    async fn fetch_token(&self) -> Result<String>;
}

/// Exchanges the refresh token for a bearer token over HTTP
pub struct RefreshTokenExchange {
    http_client: Client,
    url: String,
    refresh_token: String,
}

impl RefreshTokenExchange {
    /// Create an exchange against `base_url` + [`TOKEN_ACCESS_PATH`]
    pub fn new(http_client: Client, base_url: &str, refresh_token: impl Into<String>) -> Self {
        Self {
            http_client,
            url: format!("{}{TOKEN_ACCESS_PATH}", base_url.trim_end_matches('/')),
            refresh_token: refresh_token.into(),
        }
    }

    /// Endpoint this exchange calls
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenSource for RefreshTokenExchange {
    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .http_client
            .get(&self.url)
            .header("Authorization", format!("Basic {}", self.refresh_token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_refresh(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(Error::Http)?;
        body.into_token()
            .ok_or_else(|| Error::token_refresh("response has no authentication_token"))
    }
}

impl std::fmt::Debug for RefreshTokenExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenExchange")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Shared holder of the live bearer token
///
/// Cloning is cheap; clones observe the same token. Refreshes are serialized
/// and de-duplicated: a caller that saw a token rejected only triggers an
/// exchange if the store still holds that same token.
#[derive(Clone)]
pub struct TokenStore {
    current: Arc<RwLock<Option<CachedToken>>>,
    refresh_lock: Arc<Mutex<()>>,
    source: Arc<dyn TokenSource>,
    refreshes: Arc<AtomicU64>,
}

impl TokenStore {
    /// Create a store backed by `source`, optionally seeded with a token
    pub fn new(source: Arc<dyn TokenSource>, initial: Option<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.map(CachedToken::supplied))),
            refresh_lock: Arc::new(Mutex::new(())),
            source,
            refreshes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current token, if one is held
    pub async fn current(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|t| t.token.clone())
    }

    /// Current token details, if one is held
    pub async fn cached(&self) -> Option<CachedToken> {
        self.current.read().await.clone()
    }

    /// Current token, minting one first if none is held
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have minted one while we waited
        if let Some(token) = self.current().await {
            return Ok(token);
        }
        debug!("No bearer token held, requesting one");
        self.mint().await
    }

    /// Replace the held token
    pub async fn replace(&self, token: impl Into<String>) {
        *self.current.write().await = Some(CachedToken::fresh(token));
    }

    /// Refresh after `stale` was rejected by the server
    ///
    /// Returns the token to retry with, which is a newer token minted by
    /// another task when one exists.
    pub async fn refresh_if_stale(&self, stale: &str) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.current().await {
            if token != stale {
                debug!("Bearer token already refreshed by another caller");
                return Ok(token);
            }
        }
        info!("Bearer token rejected, refreshing");
        self.mint().await
    }

    /// Number of successful exchanges performed by this store
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    async fn mint(&self) -> Result<String> {
        let token = self.source.fetch_token().await?;
        *self.current.write().await = Some(CachedToken::fresh(token.clone()));
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
