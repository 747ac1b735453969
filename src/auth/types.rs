//! Token types

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A bearer token together with the time it was obtained
#[derive(Clone)]
pub struct CachedToken {
    /// The bearer token
    pub token: String,
    /// When the token was obtained (None for tokens supplied by configuration)
    pub obtained_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Wrap a token supplied up-front by the caller
    pub fn supplied(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: None,
        }
    }

    /// Wrap a token that was just minted
    pub fn fresh(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: Some(Utc::now()),
        }
    }

    /// Check whether this token came from a refresh exchange
    pub fn is_refreshed(&self) -> bool {
        self.obtained_at.is_some()
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Body returned by the token access endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub result: Option<TokenResult>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `result` part of the token access response
#[derive(Debug, Deserialize)]
pub struct TokenResult {
    #[serde(default)]
    pub authentication_token: Option<String>,
}

impl TokenResponse {
    /// Extract a non-empty bearer token
    pub fn into_token(self) -> Option<String> {
        self.result
            .and_then(|r| r.authentication_token)
            .filter(|t| !t.is_empty())
    }
}
