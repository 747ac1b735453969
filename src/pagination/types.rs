//! Pagination types
//!
//! Query parameters for listing calls and per-page response parsing.

use crate::error::{Error, Result};
use crate::http::{ApiResponse, RequestConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction for listing calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters accepted by listing endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    /// Records per page
    pub limit: Option<u32>,
    /// Records to skip before the first page
    pub offset: Option<u32>,
    /// Server-side filter document, e.g. `{"name": "orders"}`
    pub filter: Option<Value>,
    /// Field to sort by
    pub sort_by: Option<String>,
    /// Sort direction
    pub order_by: Option<SortOrder>,
    /// Fields to return
    pub projections: Vec<String>,
    /// Extra endpoint-specific parameters
    pub extra: Vec<(String, String)>,
}

impl ListParams {
    /// Create empty params (server defaults apply)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the starting offset
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the filter document
    #[must_use]
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sort by a field
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.order_by = Some(order);
        self
    }

    /// Restrict returned fields
    #[must_use]
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projections.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add an endpoint-specific parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Render as query parameters, in a stable order
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(filter) = &self.filter {
            query.push(("filter".to_string(), filter.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            query.push(("sort_by".to_string(), sort_by.clone()));
        }
        if let Some(order) = self.order_by {
            query.push(("order_by".to_string(), order.as_str().to_string()));
        }
        if !self.projections.is_empty() {
            query.push(("projections".to_string(), self.projections.join(",")));
        }
        query.extend(self.extra.iter().cloned());
        query
    }

    /// Render as a request config
    pub fn to_request_config(&self) -> RequestConfig {
        self.to_query()
            .into_iter()
            .fold(RequestConfig::new(), |config, (k, v)| config.query(k, v))
    }
}

/// One validated page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records on this page, in server order
    pub records: Vec<Value>,
    /// Cursor to the next page, if the server sent one
    pub next: Option<String>,
}

impl Page {
    /// Validate a listing response
    ///
    /// Fails when the response is not 2xx or has no `result`, so callers
    /// never mistake a broken page for the end of the listing.
    pub fn from_response(url: &str, response: &ApiResponse) -> Result<Self> {
        if !response.is_success() {
            let body = response.message().unwrap_or_default();
            return Err(Error::http_status(response.status, body));
        }

        let records = match response.result() {
            Some(Value::Array(items)) => items.clone(),
            Some(obj @ Value::Object(_)) => vec![obj.clone()],
            _ => return Err(Error::missing_result(url, "result")),
        };

        let next = response
            .body
            .get("links")
            .and_then(|links| links.get("next"))
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(String::from);

        Ok(Self { records, next })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
