//! Workflows and workflow runs

use super::base::{envelope_try, require_id, result_id, ResourceApi};
use crate::envelope::{Envelope, ErrorCode};
use crate::error::Error;
use crate::pagination::ListParams;
use reqwest::Method;
use serde_json::{json, Value};

/// Where a run's state lives in the run status response
pub const RUN_STATUS_POINTER: &str = "/result/workflow_status/state";

/// Client for `/v3/domains/{domain}/workflows`
#[derive(Debug, Clone)]
pub struct WorkflowsApi {
    api: ResourceApi,
}

fn workflows_path(domain_id: &str) -> String {
    format!("/v3/domains/{domain_id}/workflows")
}

impl WorkflowsApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, domain_id: &str, params: &ListParams) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        self.api.list(&workflows_path(domain), params).await
    }

    pub async fn get(&self, domain_id: &str, workflow_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        self.api
            .get_entity(&format!("{}/{id}", workflows_path(domain)))
            .await
    }

    pub async fn create(&self, domain_id: &str, body: Value) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        self.api.create(&workflows_path(domain), body).await
    }

    pub async fn update(&self, domain_id: &str, workflow_id: &str, body: Value) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        self.api
            .update(Method::PATCH, &format!("{}/{id}", workflows_path(domain)), body)
            .await
    }

    pub async fn delete(&self, domain_id: &str, workflow_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        self.api
            .delete(&format!("{}/{id}", workflows_path(domain)))
            .await
    }

    /// Start a run; the envelope's job id is the run id
    pub async fn trigger(&self, domain_id: &str, workflow_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        let path = format!("{}/{id}/start", workflows_path(domain));
        let response = envelope_try!(self.api.client().post(&path, json!({})).await);
        if !response.is_success() {
            return Envelope::from_api_response(response);
        }

        // Run ids come back either as `result.id` or `result.workflow_run_id`
        let run_id = response.result().and_then(|result| {
            result
                .get("workflow_run_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| result_id(result))
        });
        match run_id {
            Some(run_id) => Envelope::success_with_job(run_id, response.body),
            None => Envelope::failure(
                ErrorCode::MissingResult,
                Error::missing_result(&path, "result.workflow_run_id").to_string(),
                response.body,
            ),
        }
    }

    pub async fn run_status(&self, domain_id: &str, workflow_id: &str, run_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        let run = envelope_try!(require_id("run_id", run_id));
        self.api
            .get_raw(
                &format!("{}/{id}/runs/{run}", workflows_path(domain)),
                &ListParams::new(),
            )
            .await
            .with_job_id(run)
    }

    /// Block until the run reaches a terminal state
    pub async fn wait_for_run(&self, domain_id: &str, workflow_id: &str, run_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        let run = envelope_try!(require_id("run_id", run_id));
        self.api
            .wait_with_pointer(
                run,
                &format!("{}/{id}/runs/{run}", workflows_path(domain)),
                RUN_STATUS_POINTER,
            )
            .await
    }

    pub async fn export_configuration(&self, domain_id: &str, workflow_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        let path = format!("{}/{id}/config-migration", workflows_path(domain));
        self.api.get_raw(&path, &ListParams::new()).await
    }

    pub async fn import_configuration(
        &self,
        domain_id: &str,
        workflow_id: &str,
        configuration: Value,
    ) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("workflow_id", workflow_id));
        let path = format!("{}/{id}/config-migration", workflows_path(domain));
        self.api.post_action(&path, configuration).await
    }
}
