//! Platform-wide job operations

use super::base::{envelope_try, require_id, ResourceApi};
use crate::envelope::Envelope;
use crate::pagination::ListParams;
use serde_json::json;

const JOBS_PATH: &str = "/v3/admin/jobs";

/// Client for `/v3/admin/jobs`
#[derive(Debug, Clone)]
pub struct JobsApi {
    api: ResourceApi,
}

impl JobsApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn get_job(&self, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("job_id", job_id));
        self.api
            .get_entity(&format!("{JOBS_PATH}/{id}"))
            .await
            .with_job_id(id)
    }

    pub async fn list_jobs(&self, params: &ListParams) -> Envelope {
        self.api.list(JOBS_PATH, params).await
    }

    pub async fn cancel_job(&self, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("job_id", job_id));
        self.api
            .post_action(&format!("{JOBS_PATH}/{id}/cancel"), json!({}))
            .await
            .with_job_id(id)
    }

    /// Every log entry of a job
    pub async fn job_logs(&self, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("job_id", job_id));
        self.api
            .list(&format!("{JOBS_PATH}/{id}/logs"), &ListParams::new())
            .await
            .with_job_id(id)
    }

    /// Block until the job reaches a terminal status
    pub async fn wait_for_job(&self, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("job_id", job_id));
        self.api.wait(id, &format!("{JOBS_PATH}/{id}")).await
    }
}
