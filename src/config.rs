//! Client configuration
//!
//! `ClientConfig` describes where the platform lives and which credentials
//! and default identifiers to use. It is plain data: the live bearer token is
//! owned by the [`TokenStore`](crate::auth::TokenStore) once a client is built.

use crate::error::{Error, Result};
use crate::types::{OptionStringExt, Protocol};
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Client Config
// ============================================================================

/// Connection, credential and default-identifier settings for one client
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL scheme
    #[serde(default)]
    pub protocol: Protocol,

    /// Platform host name or address
    pub host: String,

    /// Platform port, the protocol's well-known port when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Initial bearer token (optional, fetched on first use when absent)
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Long-lived refresh token used to obtain bearer tokens
    pub refresh_token: String,

    /// Environment used when a call does not name one
    #[serde(default)]
    pub default_environment_id: Option<String>,

    /// Storage used when a call does not name one
    #[serde(default)]
    pub default_storage_id: Option<String>,

    /// Compute used when a call does not name one
    #[serde(default)]
    pub default_compute_id: Option<String>,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Port requests are sent to
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// Base URL rendered as `protocol://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port())
    }

    /// Resolve a path or absolute URL against the base URL
    pub fn resolve(&self, path_or_url: &str) -> Result<String> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            return Ok(path_or_url.to_string());
        }
        let base = Url::parse(&self.base_url())?;
        Ok(base.join(path_or_url)?.to_string())
    }

    /// Resolve a `links.next` cursor against the configured base URL
    ///
    /// Absolute cursors keep only their path and query, so paging always
    /// stays on the configured protocol, host and port.
    pub fn resolve_cursor(&self, cursor: &str) -> Result<String> {
        let relative = match Url::parse(cursor) {
            Ok(absolute) if Protocol::from_scheme(absolute.scheme()).is_some() => {
                match absolute.query() {
                    Some(query) => format!("{}?{}", absolute.path(), query),
                    None => absolute.path().to_string(),
                }
            }
            _ => cursor.to_string(),
        };
        let base = Url::parse(&self.base_url())?;
        Ok(base.join(&relative)?.to_string())
    }

    /// Check that the config can be used to reach the platform
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::missing_field("host"));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(Error::missing_field("refresh_token"));
        }
        if self.port == Some(0) {
            return Err(Error::config("port must be non-zero"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port())
            .field("has_bearer_token", &self.bearer_token.is_some())
            .field("default_environment_id", &self.default_environment_id)
            .field("default_storage_id", &self.default_storage_id)
            .field("default_compute_id", &self.default_compute_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    protocol: Option<Protocol>,
    host: Option<String>,
    port: Option<u16>,
    bearer_token: Option<String>,
    refresh_token: Option<String>,
    default_environment_id: Option<String>,
    default_storage_id: Option<String>,
    default_compute_id: Option<String>,
}

impl ClientConfigBuilder {
    /// Set the protocol
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set the host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set protocol, host and port from a URL such as `https://iwx.example.com:3001`
    pub fn base_url(mut self, url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;
        let protocol = Protocol::from_scheme(parsed.scheme())
            .ok_or_else(|| Error::config(format!("unsupported scheme '{}'", parsed.scheme())))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config(format!("no host in '{url}'")))?;
        self.port = Some(parsed.port().unwrap_or_else(|| protocol.default_port()));
        self.protocol = Some(protocol);
        self.host = Some(host.to_string());
        Ok(self)
    }

    /// Set the initial bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the refresh token
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the default environment identifier
    pub fn default_environment(mut self, id: impl Into<String>) -> Self {
        self.default_environment_id = Some(id.into());
        self
    }

    /// Set the default storage identifier
    pub fn default_storage(mut self, id: impl Into<String>) -> Self {
        self.default_storage_id = Some(id.into());
        self
    }

    /// Set the default compute identifier
    pub fn default_compute(mut self, id: impl Into<String>) -> Self {
        self.default_compute_id = Some(id.into());
        self
    }

    /// Build and validate the config
    pub fn build(self) -> Result<ClientConfig> {
        let protocol = self.protocol.unwrap_or_default();
        let config = ClientConfig {
            protocol,
            host: self.host.ok_or_else(|| Error::missing_field("host"))?,
            port: self.port,
            bearer_token: self.bearer_token.none_if_empty(),
            refresh_token: self
                .refresh_token
                .ok_or_else(|| Error::missing_field("refresh_token"))?,
            default_environment_id: self.default_environment_id.none_if_empty(),
            default_storage_id: self.default_storage_id.none_if_empty(),
            default_compute_id: self.default_compute_id.none_if_empty(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientConfig {
        ClientConfig::builder()
            .host("iwx.example.com")
            .port(3001)
            .refresh_token("refresh-abc")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder()
            .host("iwx.example.com")
            .refresh_token("r")
            .build()
            .unwrap();

        assert_eq!(config.protocol, Protocol::Https);
        assert_eq!(config.port(), 443);
        assert!(config.bearer_token.is_none());
        assert!(config.default_environment_id.is_none());
    }

    #[test]
    fn test_builder_from_base_url() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:8080")
            .unwrap()
            .refresh_token("r")
            .default_environment("")
            .default_compute("compute-1")
            .build()
            .unwrap();

        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
        assert!(config.default_environment_id.is_none());
        assert_eq!(config.default_compute_id.as_deref(), Some("compute-1"));
    }

    #[test]
    fn test_builder_rejects_missing_fields() {
        let err = ClientConfig::builder().host("h").build().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "refresh_token"));

        let err = ClientConfig::builder()
            .host("  ")
            .refresh_token("r")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "host"));

        assert!(ClientConfig::builder().base_url("ftp://host").is_err());
    }

    #[test]
    fn test_resolve() {
        let config = sample();
        assert_eq!(
            config.resolve("/v3/sources?offset=20").unwrap(),
            "https://iwx.example.com:3001/v3/sources?offset=20"
        );
        assert_eq!(
            config.resolve("http://other:1/x").unwrap(),
            "http://other:1/x"
        );
    }

    #[test]
    fn test_resolve_cursor_stays_on_configured_host() {
        let config = sample();
        assert_eq!(
            config
                .resolve_cursor("http://internal-node:3001/v3/sources?offset=1")
                .unwrap(),
            "https://iwx.example.com:3001/v3/sources?offset=1"
        );
        assert_eq!(
            config.resolve_cursor("https://10.0.0.4/v3/domains").unwrap(),
            "https://iwx.example.com:3001/v3/domains"
        );
        assert_eq!(
            config.resolve_cursor("/v3/sources?offset=2").unwrap(),
            "https://iwx.example.com:3001/v3/sources?offset=2"
        );
    }

    #[test]
    fn test_deserialize() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "protocol": "http",
            "host": "localhost",
            "refresh_token": "r",
            "default_storage_id": "storage-9"
        }))
        .unwrap();

        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.port(), 80);
        assert_eq!(config.base_url(), "http://localhost:80");
        assert_eq!(config.default_storage_id.as_deref(), Some("storage-9"));
    }

    #[test]
    fn test_deserialized_and_built_ports_agree() {
        let built = ClientConfig::builder()
            .protocol(Protocol::Http)
            .host("localhost")
            .refresh_token("r")
            .build()
            .unwrap();
        let parsed: ClientConfig = serde_json::from_value(serde_json::json!({
            "protocol": "http",
            "host": "localhost",
            "refresh_token": "r"
        }))
        .unwrap();
        assert_eq!(built.base_url(), parsed.base_url());

        let explicit: ClientConfig = serde_json::from_value(serde_json::json!({
            "host": "localhost",
            "port": 3001,
            "refresh_token": "r"
        }))
        .unwrap();
        assert_eq!(explicit.base_url(), "https://localhost:3001");

        let zero: ClientConfig = serde_json::from_value(serde_json::json!({
            "host": "localhost",
            "port": 0,
            "refresh_token": "r"
        }))
        .unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let config = ClientConfig::builder()
            .host("h")
            .refresh_token("super-secret")
            .bearer_token("bearer-secret")
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("bearer-secret"));
    }
}
