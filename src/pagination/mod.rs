//! Pagination module
//!
//! Listing endpoints answer with a `result` collection and an optional
//! `links.next` cursor. The collector follows the cursor until the server
//! runs out of pages, keeping records in the order they arrive.
//!
//! # Overview
//!
//! - [`ListParams`] renders limit/offset/filter/sort query parameters
//! - [`Page`] validates one response and extracts its records and cursor
//! - [`PageCollector`] follows cursors and accumulates every page
//! - [`list_all`] wraps the whole listing into an [`Envelope`](crate::envelope::Envelope)

mod collector;
mod types;

pub use collector::{collect_pages, list_all, PageCollector, DEFAULT_MAX_PAGES};
pub use types::{ListParams, Page, SortOrder};
