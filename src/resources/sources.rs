//! Sources, their tables and ingestion jobs

use super::base::{envelope_try, fill_defaults, require_id, ResourceApi};
use crate::envelope::Envelope;
use crate::pagination::ListParams;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Job types that can be submitted against a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceJobType {
    /// Check connectivity to the source system
    SourceTestConnection,
    /// Crawl schemas and table metadata
    SourceStructureFetch,
    /// Full reload of the selected tables
    TruncateReload,
    /// Incremental ingestion of the selected tables
    IngestTable,
}

impl SourceJobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceJobType::SourceTestConnection => "source_test_connection",
            SourceJobType::SourceStructureFetch => "source_structure_fetch",
            SourceJobType::TruncateReload => "truncate_reload",
            SourceJobType::IngestTable => "ingest_table",
        }
    }
}

/// Parameters for a source job submission
#[derive(Debug, Clone, PartialEq)]
pub struct SourceJob {
    pub job_type: SourceJobType,
    pub job_name: Option<String>,
    pub table_ids: Vec<String>,
    pub table_group_id: Option<String>,
    pub compute_id: Option<String>,
}

impl SourceJob {
    pub fn new(job_type: SourceJobType) -> Self {
        Self {
            job_type,
            job_name: None,
            table_ids: Vec::new(),
            table_group_id: None,
            compute_id: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn tables<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn table_group(mut self, id: impl Into<String>) -> Self {
        self.table_group_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn compute(mut self, id: impl Into<String>) -> Self {
        self.compute_id = Some(id.into());
        self
    }

    fn to_body(&self, default_compute: Option<&String>) -> Value {
        let mut body = json!({ "job_type": self.job_type.as_str() });
        if let Some(name) = &self.job_name {
            body["job_name"] = json!(name);
        }
        if !self.table_ids.is_empty() {
            body["table_ids"] = json!(self.table_ids);
        }
        if let Some(group) = &self.table_group_id {
            body["table_group_id"] = json!(group);
        }
        if let Some(compute) = self.compute_id.as_ref().or(default_compute) {
            body["compute_id"] = json!(compute);
        }
        body
    }
}

/// Client for `/v3/sources`
#[derive(Debug, Clone)]
pub struct SourcesApi {
    api: ResourceApi,
}

impl SourcesApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, params: &ListParams) -> Envelope {
        self.api.list("/v3/sources", params).await
    }

    pub async fn get(&self, source_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api.get_entity(&format!("/v3/sources/{id}")).await
    }

    /// Create a source; missing environment/storage ids come from the
    /// client's defaults
    pub async fn create(&self, mut body: Value) -> Envelope {
        let conn = self.api.client().connection();
        fill_defaults(
            &mut body,
            &[
                ("environment_id", conn.default_environment_id.as_ref()),
                ("storage_id", conn.default_storage_id.as_ref()),
            ],
        );
        self.api.create("/v3/sources", body).await
    }

    pub async fn update(&self, source_id: &str, body: Value) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api
            .update(Method::PATCH, &format!("/v3/sources/{id}"), body)
            .await
    }

    pub async fn delete(&self, source_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api.delete(&format!("/v3/sources/{id}")).await
    }

    pub async fn list_tables(&self, source_id: &str, params: &ListParams) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api
            .list(&format!("/v3/sources/{id}/tables"), params)
            .await
    }

    pub async fn get_table(&self, source_id: &str, table_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let table = envelope_try!(require_id("table_id", table_id));
        self.api
            .get_entity(&format!("/v3/sources/{id}/tables/{table}"))
            .await
    }

    pub async fn update_table(&self, source_id: &str, table_id: &str, body: Value) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let table = envelope_try!(require_id("table_id", table_id));
        self.api
            .update(
                Method::PATCH,
                &format!("/v3/sources/{id}/tables/{table}"),
                body,
            )
            .await
    }

    pub async fn list_table_groups(&self, source_id: &str, params: &ListParams) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api
            .list(&format!("/v3/sources/{id}/table-groups"), params)
            .await
    }

    pub async fn create_table_group(&self, source_id: &str, body: Value) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api
            .create(&format!("/v3/sources/{id}/table-groups"), body)
            .await
    }

    /// Submit a job; the envelope carries the job id
    pub async fn submit_job(&self, source_id: &str, job: &SourceJob) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let body = job.to_body(
            self.api
                .client()
                .connection()
                .default_compute_id
                .as_ref(),
        );
        self.api
            .submit_job(&format!("/v3/sources/{id}/jobs"), body)
            .await
    }

    pub async fn job_status(&self, source_id: &str, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .get_entity(&format!("/v3/sources/{id}/jobs/{job}"))
            .await
    }

    /// Block until the job reaches a terminal status
    pub async fn wait_for_job(&self, source_id: &str, job_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let job = envelope_try!(require_id("job_id", job_id));
        self.api
            .wait(job, &format!("/v3/sources/{id}/jobs/{job}"))
            .await
    }

    /// Submit a job and wait for it
    pub async fn run_job(&self, source_id: &str, job: &SourceJob) -> Envelope {
        let submitted = self.submit_job(source_id, job).await;
        match submitted.job_id() {
            Some(job_id) if submitted.is_success() => {
                let job_id = job_id.to_string();
                self.wait_for_job(source_id, &job_id).await
            }
            _ => submitted,
        }
    }

    pub async fn export_configuration(&self, source_id: &str) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        let path = format!("/v3/sources/{id}/configurations/json");
        self.api.get_raw(&path, &ListParams::new()).await
    }

    pub async fn import_configuration(&self, source_id: &str, configuration: Value) -> Envelope {
        let id = envelope_try!(require_id("source_id", source_id));
        self.api
            .post_action(&format!("/v3/sources/{id}/configurations/json"), configuration)
            .await
    }
}

#[cfg(test)]
mod source_tests {
    use super::*;

    #[test]
    fn test_source_job_body() {
        let compute = "compute-default".to_string();
        let body = SourceJob::new(SourceJobType::TruncateReload)
            .name("nightly")
            .tables(["t1", "t2"])
            .to_body(Some(&compute));

        assert_eq!(
            body,
            json!({
                "job_type": "truncate_reload",
                "job_name": "nightly",
                "table_ids": ["t1", "t2"],
                "compute_id": "compute-default"
            })
        );

        let body = SourceJob::new(SourceJobType::SourceStructureFetch)
            .compute("c-explicit")
            .to_body(Some(&compute));
        assert_eq!(body["compute_id"], "c-explicit");
    }
}
