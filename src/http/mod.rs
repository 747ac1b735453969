//! HTTP dispatcher module
//!
//! Provides the single entry point every resource client uses to talk to the
//! platform.
//!
//! # Features
//!
//! - **Token Refresh**: 401/406 triggers one refresh and one re-issue
//! - **Automatic Retries**: 429/5xx and connect/timeout failures, with backoff
//! - **Rate Limiting**: Optional token bucket shared by all callers
//! - **Uniform Responses**: Status code plus decoded JSON body

mod client;
mod rate_limit;

pub use client::{ApiResponse, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
