//! Bulk configuration transfer
//!
//! Moves configuration documents between environments: [`BulkUploader`]
//! imports a batch of [`ConfigArtifact`]s (or exports a batch of entities)
//! with a fixed number of workers pulling from a bounded queue.

mod types;
mod uploader;

pub use types::{ArtifactKind, ConfigArtifact, EntityRef, UploadOutcome};
pub use uploader::{BulkUploader, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
