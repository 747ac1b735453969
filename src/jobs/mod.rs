//! Asynchronous job polling
//!
//! Most long-running platform operations (ingestion, pipeline builds,
//! workflow runs, replication) return a job id immediately. [`JobPoller`]
//! checks the job's status endpoint at a fixed interval until the job
//! reaches a terminal status, the timeout elapses, or status checks keep
//! failing.

mod poller;
mod types;

pub use poller::JobPoller;
pub use types::{
    JobStatus, PollConfig, PollTimeout, DEFAULT_POLL_INTERVAL, UNBOUNDED_POLL_CEILING,
};
