//! Resource clients
//!
//! One thin client per platform resource family. Each wraps a shared
//! [`ResourceApi`] and only knows its URL templates and payload shapes; the
//! request, pagination, envelope and polling logic lives below them.
//!
//! Every operation that takes an identifier rejects an empty one with a
//! `VALIDATION` failure envelope before any request is made.

mod admin;
mod base;
mod domains;
mod jobs;
mod pipelines;
mod replicator;
mod sources;
mod workflows;

pub use admin::{AdminApi, DefaultIds, DefaultNames};
pub use base::{require_id, result_id, ResourceApi};
pub use domains::DomainsApi;
pub use jobs::JobsApi;
pub use pipelines::PipelinesApi;
pub use replicator::ReplicatorApi;
pub use sources::{SourceJob, SourceJobType, SourcesApi};
pub use workflows::{WorkflowsApi, RUN_STATUS_POINTER};

#[cfg(test)]
mod tests;
