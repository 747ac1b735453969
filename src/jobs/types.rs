//! Job polling types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Ceiling applied when a poll is asked to wait indefinitely
pub const UNBOUNDED_POLL_CEILING: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default interval between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Status reported by the platform for a job or workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Aborted,
    Canceled,
    /// Any status this client does not know; treated as non-terminal
    Other(String),
}

impl JobStatus {
    /// Parse a status string (case-insensitive)
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => JobStatus::Pending,
            "running" | "in_progress" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "aborted" => JobStatus::Aborted,
            "canceled" | "cancelled" => JobStatus::Canceled,
            _ => JobStatus::Other(status.to_string()),
        }
    }

    /// Polling stops once one of these is observed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Aborted | JobStatus::Canceled
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Aborted => "aborted",
            JobStatus::Canceled => "canceled",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::parse(&s)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a poll may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollTimeout {
    /// Wait until a terminal status or retry exhaustion (bounded by
    /// [`UNBOUNDED_POLL_CEILING`])
    #[default]
    Unbounded,
    /// Give up after this long
    After(Duration),
}

impl PollTimeout {
    /// Convert a seconds value where any negative number (conventionally
    /// `-1`) means "wait indefinitely"
    pub fn from_secs(secs: i64) -> Self {
        if secs < 0 {
            PollTimeout::Unbounded
        } else {
            PollTimeout::After(Duration::from_secs(secs.unsigned_abs()))
        }
    }

    /// Effective wall-clock limit
    pub fn limit(&self) -> Duration {
        match self {
            PollTimeout::Unbounded => UNBOUNDED_POLL_CEILING,
            PollTimeout::After(d) => *d,
        }
    }
}

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status checks
    pub interval: Duration,
    /// Overall limit
    pub timeout: PollTimeout,
    /// Failed status checks tolerated before giving up
    pub retry_limit: u32,
    /// JSON pointer to the status string in the status response
    pub status_pointer: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: PollTimeout::Unbounded,
            retry_limit: 3,
            status_pointer: "/result/status".to_string(),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: PollTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    #[must_use]
    pub fn status_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.status_pointer = pointer.into();
        self
    }
}
