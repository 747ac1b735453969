//! Replication definitions and replication jobs

use super::base::{envelope_try, require_id, ResourceApi};
use crate::envelope::Envelope;
use crate::pagination::ListParams;
use serde_json::{json, Value};

const DEFINITIONS_PATH: &str = "/v3/replicator/definitions";

/// Client for `/v3/replicator/definitions`
#[derive(Debug, Clone)]
pub struct ReplicatorApi {
    api: ResourceApi,
}

impl ReplicatorApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn list_definitions(&self, params: &ListParams) -> Envelope {
        self.api.list(DEFINITIONS_PATH, params).await
    }

    pub async fn get_definition(&self, definition_id: &str) -> Envelope {
        let id = envelope_try!(require_id("definition_id", definition_id));
        self.api
            .get_entity(&format!("{DEFINITIONS_PATH}/{id}"))
            .await
    }

    pub async fn create_definition(&self, body: Value) -> Envelope {
        self.api.create(DEFINITIONS_PATH, body).await
    }

    /// Submit a replication job for a definition
    pub async fn trigger_replication(&self, definition_id: &str) -> Envelope {
        let id = envelope_try!(require_id("definition_id", definition_id));
        self.api
            .submit_job(
                &format!("{DEFINITIONS_PATH}/{id}/jobs"),
                json!({ "job_type": "replicate" }),
            )
            .await
    }

    pub async fn job_status(&self, definition_id: &str, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("definition_id", definition_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .get_entity(&format!("{DEFINITIONS_PATH}/{id}/jobs/{job}"))
            .await
    }

    pub async fn wait_for_job(&self, definition_id: &str, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("definition_id", definition_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .wait(job, &format!("{DEFINITIONS_PATH}/{id}/jobs/{job}"))
            .await
    }
}
