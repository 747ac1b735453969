//! Job status poll loop

use super::types::{JobStatus, PollConfig};
use crate::envelope::{Envelope, ErrorCode};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Polls a status endpoint until the job reaches a terminal status
#[derive(Debug, Clone)]
pub struct JobPoller<'a> {
    client: &'a HttpClient,
    config: PollConfig,
}

impl<'a> JobPoller<'a> {
    pub fn new(client: &'a HttpClient, config: PollConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `status_path` for `job_id`
    ///
    /// The first check happens immediately. A `completed` job yields a
    /// success envelope; `failed`, `aborted` and `canceled` yield a
    /// `JobFailed` envelope. Both carry the job id and the last status
    /// response. Timeout and retry exhaustion yield failure envelopes too.
    pub async fn poll(&self, job_id: &str, status_path: &str) -> Envelope {
        if job_id.trim().is_empty() {
            return Envelope::from_error(&Error::validation("job_id", "must not be empty"));
        }

        let started = Instant::now();
        let limit = self.config.timeout.limit();
        let retry_limit = self.config.retry_limit.max(1);
        let mut failures = 0u32;
        let mut last = Value::Null;

        loop {
            match self.check(status_path).await {
                Ok((status, body)) => {
                    last = body;
                    debug!("Job {} status: {}", job_id, status);
                    if status.is_terminal() {
                        info!("Job {} finished with status {}", job_id, status);
                        return finished(job_id, &status, last);
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Status check for job {} failed ({}/{}): {}",
                        job_id, failures, retry_limit, e
                    );
                    if failures >= retry_limit {
                        let err = Error::PollRetriesExhausted {
                            job_id: job_id.to_string(),
                            failures,
                        };
                        return Envelope::job_failure(
                            ErrorCode::RetryExhausted,
                            job_id,
                            err.to_string(),
                            last,
                        );
                    }
                }
            }

            if started.elapsed() >= limit {
                let err = Error::PollTimeout {
                    job_id: job_id.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                };
                warn!("{}", err);
                return Envelope::job_failure(ErrorCode::Timeout, job_id, err.to_string(), last);
            }

            let remaining = limit.saturating_sub(started.elapsed());
            tokio::time::sleep(self.config.interval.min(remaining)).await;
        }
    }

    /// One status check
    async fn check(&self, status_path: &str) -> Result<(JobStatus, Value)> {
        let response = self.client.get(status_path).await?.error_for_status()?;
        let status = response
            .body
            .pointer(&self.config.status_pointer)
            .and_then(Value::as_str)
            .map(JobStatus::parse)
            .ok_or_else(|| Error::missing_result(status_path, &self.config.status_pointer))?;
        Ok((status, response.body))
    }
}

fn finished(job_id: &str, status: &JobStatus, last: Value) -> Envelope {
    if status.is_success() {
        Envelope::success_with_job(job_id, last)
    } else {
        Envelope::job_failure(
            ErrorCode::JobFailed,
            job_id,
            format!("job {job_id} finished with status {status}"),
            last,
        )
    }
}
