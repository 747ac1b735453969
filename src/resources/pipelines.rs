//! Pipelines, versions and builds

use super::base::{envelope_try, fill_defaults, require_id, ResourceApi};
use crate::envelope::Envelope;
use crate::pagination::ListParams;
use reqwest::Method;
use serde_json::{json, Value};

/// Client for `/v3/domains/{domain}/pipelines`
#[derive(Debug, Clone)]
pub struct PipelinesApi {
    api: ResourceApi,
}

fn pipelines_path(domain_id: &str) -> String {
    format!("/v3/domains/{domain_id}/pipelines")
}

impl PipelinesApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, domain_id: &str, params: &ListParams) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        self.api.list(&pipelines_path(domain), params).await
    }

    pub async fn get(&self, domain_id: &str, pipeline_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        self.api
            .get_entity(&format!("{}/{id}", pipelines_path(domain)))
            .await
    }

    /// Create a pipeline; a missing environment id comes from the client's defaults
    pub async fn create(&self, domain_id: &str, mut body: Value) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let conn = self.api.client().connection();
        fill_defaults(
            &mut body,
            &[("environment_id", conn.default_environment_id.as_ref())],
        );
        self.api.create(&pipelines_path(domain), body).await
    }

    pub async fn update(&self, domain_id: &str, pipeline_id: &str, body: Value) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        self.api
            .update(
                Method::PATCH,
                &format!("{}/{id}", pipelines_path(domain)),
                body,
            )
            .await
    }

    pub async fn delete(&self, domain_id: &str, pipeline_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        self.api
            .delete(&format!("{}/{id}", pipelines_path(domain)))
            .await
    }

    pub async fn list_versions(
        &self,
        domain_id: &str,
        pipeline_id: &str,
        params: &ListParams,
    ) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        self.api
            .list(&format!("{}/{id}/versions", pipelines_path(domain)), params)
            .await
    }

    pub async fn get_version(&self, domain_id: &str, pipeline_id: &str, version_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let version = envelope_try!(require_id("version_id", version_id));
        self.api
            .get_entity(&format!("{}/{id}/versions/{version}", pipelines_path(domain)))
            .await
    }

    /// Every node of a pipeline version
    pub async fn list_nodes(
        &self,
        domain_id: &str,
        pipeline_id: &str,
        version_id: &str,
    ) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let version = envelope_try!(require_id("version_id", version_id));
        let path = format!("{}/{id}/versions/{version}/nodes", pipelines_path(domain));
        self.api.list(&path, &ListParams::new()).await
    }

    /// Submit a build of the pipeline's active version
    pub async fn build(&self, domain_id: &str, pipeline_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let mut body = json!({ "job_type": "pipeline_build" });
        if let Some(compute) = &self.api.client().connection().default_compute_id {
            body["compute_id"] = json!(compute);
        }
        self.api
            .submit_job(&format!("{}/{id}/jobs", pipelines_path(domain)), body)
            .await
    }

    pub async fn job_status(&self, domain_id: &str, pipeline_id: &str, job_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .get_entity(&format!("{}/{id}/jobs/{job}", pipelines_path(domain)))
            .await
    }

    pub async fn wait_for_job(&self, domain_id: &str, pipeline_id: &str, job_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .wait(job, &format!("{}/{id}/jobs/{job}", pipelines_path(domain)))
            .await
    }

    pub async fn export_configuration(&self, domain_id: &str, pipeline_id: &str) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let path = format!("{}/{id}/config-migration", pipelines_path(domain));
        self.api.get_raw(&path, &ListParams::new()).await
    }

    pub async fn import_configuration(
        &self,
        domain_id: &str,
        pipeline_id: &str,
        configuration: Value,
    ) -> Envelope {
        let domain = envelope_try!(require_id("domain_id", domain_id));
        let id = envelope_try!(require_id("pipeline_id", pipeline_id));
        let path = format!("{}/{id}/config-migration", pipelines_path(domain));
        self.api.post_action(&path, configuration).await
    }
}
