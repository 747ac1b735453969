//! Cursor-following page collector

use super::types::{ListParams, Page};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpClient};
use serde_json::Value;
use tracing::debug;

/// Upper bound on pages followed for a single listing
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Follows `links.next` cursors and accumulates every page
#[derive(Debug, Clone, Copy)]
pub struct PageCollector<'a> {
    client: &'a HttpClient,
    max_pages: usize,
}

impl<'a> PageCollector<'a> {
    /// Create a collector using the given dispatcher
    pub fn new(client: &'a HttpClient) -> Self {
        Self {
            client,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Override the page limit
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Accumulate records starting from an already-fetched first page
    pub async fn collect(&self, first_url: &str, first: ApiResponse) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        let mut page = Page::from_response(first_url, &first)?;
        let mut pages = 1;

        loop {
            let empty = page.is_empty();
            records.extend(page.records);

            let next = match page.next {
                Some(next) if !empty => next,
                _ => break,
            };
            if pages >= self.max_pages {
                return Err(Error::PageLimit { pages });
            }

            let url = self.client.connection().resolve_cursor(&next)?;
            debug!("Following cursor to page {}: {}", pages + 1, url);
            let response = self.client.get(&url).await?;
            page = Page::from_response(&url, &response)?;
            pages += 1;
        }

        debug!(
            "Collected {} records across {} pages from {}",
            records.len(),
            pages,
            first_url
        );
        Ok(records)
    }

    /// Fetch the first page of `path` and follow every cursor
    pub async fn fetch_all(&self, path: &str, params: &ListParams) -> Result<Vec<Value>> {
        let first = self
            .client
            .get_with_config(path, params.to_request_config())
            .await?;
        self.collect(path, first).await
    }
}

/// Accumulate every page reachable from `first`
pub async fn collect_pages(
    client: &HttpClient,
    first_url: &str,
    first: ApiResponse,
) -> Result<Vec<Value>> {
    PageCollector::new(client).collect(first_url, first).await
}

/// List every record under `path`, folded into an envelope
///
/// On success the envelope's response is a JSON array of all records. Any
/// failed or malformed page yields a failure envelope instead of a partial list.
pub async fn list_all(client: &HttpClient, path: &str, params: &ListParams) -> Envelope {
    match PageCollector::new(client).fetch_all(path, params).await {
        Ok(records) => Envelope::success(Value::Array(records)),
        Err(e) => Envelope::from_error(&e),
    }
}
