//! Shared fixtures for unit tests

use crate::auth::TOKEN_ACCESS_PATH;
use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::BackoffType;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Connection settings pointing at a mock server, seeded with `old-token`
pub fn connection_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(&server.uri())
        .unwrap()
        .bearer_token("old-token")
        .refresh_token("refresh-1")
        .build()
        .unwrap()
}

/// Transport settings with millisecond backoff
pub fn fast_http_config() -> HttpClientConfig {
    HttpClientConfig::builder()
        .timeout(Duration::from_secs(5))
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
        .build()
}

/// Dispatcher against a mock server
pub fn client_for(server: &MockServer) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(connection_for(server), fast_http_config()).unwrap())
}

/// Token access endpoint that hands out `token`
pub async fn mount_token_endpoint(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path(TOKEN_ACCESS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"authentication_token": token}
        })))
        .mount(server)
        .await;
}
