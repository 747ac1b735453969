// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # iwx-client
//!
//! Async client for a data-integration platform's REST API: sources,
//! pipelines, domains, jobs, workflows, replication and admin resources.
//!
//! ## Features
//!
//! - **Token Refresh**: expired bearer tokens are renewed once, transparently
//! - **Retries**: 429/5xx and connection failures retried with backoff
//! - **Cursor Pagination**: every listing follows `links.next` to the end
//! - **Job Polling**: wait for ingestion, builds, runs and replication jobs
//! - **Uniform Envelopes**: every operation returns the same result shape
//! - **Lineage**: pipeline DAGs for external lineage tools
//! - **Bulk Transfer**: pooled configuration import/export for CI/CD
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use iwx_client::{ClientConfig, HttpClientConfig, PlatformClient, SourceJob, SourceJobType};
//!
//! #[tokio::main]
//! async fn main() -> iwx_client::Result<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://platform.example.com")?
//!         .refresh_token("...")
//!         .build()?;
//!     let client = PlatformClient::new(config, HttpClientConfig::default())?;
//!
//!     let job = SourceJob::new(SourceJobType::SourceStructureFetch);
//!     let envelope = client.sources().run_job("64f0c1...", &job).await;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PlatformClient                           │
//! │ sources · pipelines · domains · workflows · replicator · admin  │
//! │ jobs · lineage · bulk_uploader                                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │   Jobs    │  Envelope   │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Refresh  │ Retry     │ links.next    │ Poll      │ Success     │
//! │ Token    │ Backoff   │ Page limit    │ Timeout   │ Failure     │
//! │ Store    │ Rate Limit│               │ Retries   │ Job/Entity  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connection settings
pub mod config;

/// Bearer token exchange and storage
pub mod auth;

/// HTTP dispatcher with retry, refresh and rate limiting
pub mod http;

/// Uniform response envelope
pub mod envelope;

/// Cursor pagination
pub mod pagination;

/// Job polling
pub mod jobs;

/// Per-resource clients
pub mod resources;

/// Pipeline lineage
pub mod lineage;

/// Bulk configuration transfer
pub mod cicd;

/// Top-level client
pub mod client;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use cicd::{ArtifactKind, BulkUploader, ConfigArtifact, EntityRef, UploadOutcome};
pub use client::PlatformClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use envelope::{Envelope, ErrorCode, Status};
pub use http::{ApiResponse, HttpClient, HttpClientConfig, RequestConfig};
pub use jobs::{JobPoller, JobStatus, PollConfig, PollTimeout};
pub use lineage::{LineageBuilder, LineageGraph};
pub use pagination::{ListParams, SortOrder};
pub use resources::{
    AdminApi, DefaultIds, DefaultNames, DomainsApi, JobsApi, PipelinesApi, ReplicatorApi,
    SourceJob, SourceJobType, SourcesApi, WorkflowsApi,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
