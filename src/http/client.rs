//! HTTP dispatcher with retry and token refresh
//!
//! Every call to the platform goes through [`HttpClient::request`], which:
//! - Attaches the current bearer token
//! - Retries 429/5xx responses and connect/timeout failures with backoff
//! - Refreshes the token once and re-issues the call on 401/406
//! - Returns whatever the server answered as an [`ApiResponse`]

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{RefreshTokenExchange, TokenSource, TokenStore};
use crate::config::ClientConfig;
use crate::error::{is_auth_expired_status, is_retryable_status, Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of connection-level retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Verify server TLS certificates
    pub verify_tls: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_type: BackoffType::Exponential,
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("iwx-client/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: false,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// What the server answered: status code plus decoded body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body; `Null` when empty, `String` when the body is not JSON
    pub body: Value,
}

impl ApiResponse {
    /// Create a response from parts
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    async fn read(response: Response) -> Result<Self> {
        let status = response.status().as_u16();
        let text = response.text().await.map_err(Error::Http)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(Self { status, body })
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `result` field of the body
    pub fn result(&self) -> Option<&Value> {
        self.body.get("result")
    }

    /// A human-readable message from the body, if the server sent one
    pub fn message(&self) -> Option<String> {
        match &self.body {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => ["message", "error", "details"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                }),
            _ => None,
        }
    }

    /// Turn a non-2xx response into an error
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            let body = match &self.body {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Err(Error::http_status(self.status, body))
        }
    }
}

/// HTTP dispatcher shared by every resource client
pub struct HttpClient {
    client: Client,
    connection: ClientConfig,
    config: HttpClientConfig,
    tokens: TokenStore,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a dispatcher that refreshes tokens through the platform's
    /// token access endpoint
    pub fn new(connection: ClientConfig, config: HttpClientConfig) -> Result<Self> {
        let client = build_reqwest_client(&config)?;
        let exchange = RefreshTokenExchange::new(
            client.clone(),
            &connection.base_url(),
            connection.refresh_token.clone(),
        );
        Ok(Self::assemble(client, connection, config, Arc::new(exchange)))
    }

    /// Create a dispatcher with a custom token source
    pub fn with_token_source(
        connection: ClientConfig,
        config: HttpClientConfig,
        source: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        let client = build_reqwest_client(&config)?;
        Ok(Self::assemble(client, connection, config, source))
    }

    fn assemble(
        client: Client,
        connection: ClientConfig,
        config: HttpClientConfig,
        source: Arc<dyn TokenSource>,
    ) -> Self {
        let tokens = TokenStore::new(source, connection.bearer_token.clone());
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        Self {
            client,
            connection,
            config,
            tokens,
            rate_limiter,
        }
    }

    /// Connection settings this dispatcher was built with
    pub fn connection(&self) -> &ClientConfig {
        &self.connection
    }

    /// Shared bearer token holder
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.request(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<ApiResponse> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(Method::PUT, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request(Method::PATCH, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, url, RequestConfig::default())
            .await
    }

    /// Make a request, refreshing the bearer token once on 401/406
    ///
    /// The retried call's response is returned whatever its status. Transport
    /// failures propagate as errors.
    pub async fn request(
        &self,
        method: impl Into<Method>,
        url: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse> {
        let method = method.into();
        let full_url = self.connection.resolve(url)?;

        let token = self.tokens.token().await?;
        let response = self
            .send_with_retries(&method, &full_url, &config, &token)
            .await?;

        if !is_auth_expired_status(response.status) {
            return Ok(response);
        }

        warn!(
            "{} {} returned {}, refreshing bearer token",
            method, full_url, response.status
        );
        let fresh = self.tokens.refresh_if_stale(&token).await?;
        self.send_with_retries(&method, &full_url, &config, &fresh)
            .await
    }

    /// Send one logical request with connection-level retries
    async fn send_with_retries(
        &self,
        method: &Method,
        full_url: &str,
        config: &RequestConfig,
        token: &str,
    ) -> Result<ApiResponse> {
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let timeout = config.timeout.unwrap_or(self.config.timeout);
        let retry_statuses = is_idempotent(method);
        let mut attempt = 0;

        loop {
            // Wait for rate limiter
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self
                .client
                .request(method.clone(), full_url)
                .timeout(timeout)
                .bearer_auth(token);

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(ref body) = config.body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if retry_statuses && is_retryable_status(status) && attempt < max_retries {
                        let delay = match extract_retry_after(&response) {
                            Some(after) if status == 429 => after.min(self.config.max_backoff),
                            _ => self.calculate_backoff(attempt),
                        };
                        warn!(
                            "{} {} returned {}, attempt {}/{}, retrying in {:?}",
                            method,
                            full_url,
                            status,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    debug!("{} {} -> {}", method, full_url, status);
                    return ApiResponse::read(response).await;
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "{} {} failed ({}), attempt {}/{}, retrying in {:?}",
                            method,
                            full_url,
                            e,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                    return Err(Error::Http(e));
                }
            }
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff.saturating_mul(attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("connection", &self.connection)
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn build_reqwest_client(config: &HttpClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(!config.verify_tls)
        .build()
        .map_err(Error::Http)
}

/// Methods whose 429/5xx answers are retried
fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::PUT | Method::DELETE | Method::HEAD | Method::OPTIONS
    )
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
