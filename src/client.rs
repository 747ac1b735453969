//! Top-level client
//!
//! [`PlatformClient`] owns one dispatcher and hands out resource clients that
//! share it, along with its token store and connection pool.

use crate::cicd::BulkUploader;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::jobs::PollConfig;
use crate::lineage::LineageBuilder;
use crate::resources::{
    AdminApi, DomainsApi, JobsApi, PipelinesApi, ReplicatorApi, ResourceApi, SourcesApi,
    WorkflowsApi,
};
use std::sync::Arc;
use tracing::info;

/// Entry point for every platform operation
///
/// ```rust,ignore
/// use iwx_client::{ClientConfig, HttpClientConfig, ListParams, PlatformClient};
///
/// let config = ClientConfig::builder()
///     .base_url("https://platform.example.com:443")?
///     .refresh_token(std::env::var("PLATFORM_REFRESH_TOKEN")?)
///     .build()?;
/// let client = PlatformClient::new(config, HttpClientConfig::default())?;
///
/// let sources = client.sources().list(&ListParams::new().limit(50)).await;
/// if sources.is_success() {
///     println!("{}", sources.response());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: Arc<HttpClient>,
    poll: PollConfig,
}

impl PlatformClient {
    /// Validate the configuration and build the shared dispatcher
    pub fn new(config: ClientConfig, http_config: HttpClientConfig) -> Result<Self> {
        let host = config.base_url();
        let http = HttpClient::new(config, http_config)?;
        info!("Platform client ready for {}", host);
        Ok(Self::from_http(Arc::new(http)))
    }

    /// Wrap an existing dispatcher
    pub fn from_http(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            poll: PollConfig::default(),
        }
    }

    /// Poll settings used by every `wait_for_*` operation
    #[must_use]
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    pub fn config(&self) -> &ClientConfig {
        self.http.connection()
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Bearer token currently in use, if one has been obtained
    pub async fn current_token(&self) -> Option<String> {
        self.http.tokens().current().await
    }

    fn api(&self) -> ResourceApi {
        ResourceApi::new(Arc::clone(&self.http), self.poll.clone())
    }

    pub fn sources(&self) -> SourcesApi {
        SourcesApi::new(self.api())
    }

    pub fn pipelines(&self) -> PipelinesApi {
        PipelinesApi::new(self.api())
    }

    pub fn domains(&self) -> DomainsApi {
        DomainsApi::new(self.api())
    }

    pub fn workflows(&self) -> WorkflowsApi {
        WorkflowsApi::new(self.api())
    }

    pub fn replicator(&self) -> ReplicatorApi {
        ReplicatorApi::new(self.api())
    }

    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.api())
    }

    pub fn jobs(&self) -> JobsApi {
        JobsApi::new(self.api())
    }

    pub fn lineage(&self) -> LineageBuilder<'_> {
        LineageBuilder::new(&self.http)
    }

    /// Worker pool for bulk configuration transfers
    pub fn bulk_uploader(&self, workers: usize, queue_capacity: usize) -> BulkUploader {
        BulkUploader::new(self.api(), workers, queue_capacity)
    }
}
