//! Tests for resource clients

use super::*;
use crate::config::ClientConfig;
use crate::envelope::ErrorCode;
use crate::http::HttpClient;
use crate::jobs::PollConfig;
use crate::pagination::ListParams;
use crate::test_support::{client_for, fast_http_config};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_poll() -> PollConfig {
    PollConfig::new()
        .interval(Duration::from_millis(10))
        .retry_limit(3)
}

fn api_for(server: &MockServer) -> ResourceApi {
    ResourceApi::new(client_for(server), fast_poll())
}

fn api_with_defaults(server: &MockServer) -> ResourceApi {
    let connection = ClientConfig::builder()
        .base_url(&server.uri())
        .unwrap()
        .bearer_token("old-token")
        .refresh_token("refresh-1")
        .default_environment("env-1")
        .default_storage("storage-1")
        .default_compute("compute-1")
        .build()
        .unwrap();
    let client = HttpClient::new(connection, fast_http_config()).unwrap();
    ResourceApi::new(Arc::new(client), fast_poll())
}

/// Mount a catch-all that fails the test if any request is made
async fn expect_no_requests(server: &MockServer) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

// ============================================================================
// Sources
// ============================================================================

#[tokio::test]
async fn test_source_get_returns_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/sources/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "s1", "name": "orders_db"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_for(&mock_server));
    let envelope = sources.get("s1").await;

    assert!(envelope.is_success());
    assert_eq!(envelope.entity_id(), Some("s1"));
    assert_eq!(envelope.response()["name"], "orders_db");
}

#[tokio::test]
async fn test_source_create_fills_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/sources"))
        .and(body_json(json!({
            "name": "orders_db",
            "environment_id": "env-1",
            "storage_id": "storage-1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": {"id": "s-new"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_with_defaults(&mock_server));
    let envelope = sources.create(json!({"name": "orders_db"})).await;

    assert!(envelope.is_success(), "{envelope:?}");
    assert_eq!(envelope.entity_id(), Some("s-new"));
}

#[tokio::test]
async fn test_source_create_without_id_is_missing_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "queued"})))
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_for(&mock_server));
    let envelope = sources.create(json!({"name": "x"})).await;

    assert_eq!(envelope.error_code(), ErrorCode::MissingResult);
    assert_eq!(envelope.response()["message"], "queued");
}

#[tokio::test]
async fn test_empty_ids_never_reach_the_network() {
    let mock_server = MockServer::start().await;
    expect_no_requests(&mock_server).await;

    let api = api_for(&mock_server);
    let sources = SourcesApi::new(api.clone());
    let pipelines = PipelinesApi::new(api.clone());
    let workflows = WorkflowsApi::new(api.clone());
    let jobs = JobsApi::new(api.clone());
    let domains = DomainsApi::new(api.clone());
    let replicator = ReplicatorApi::new(api);

    let envelopes = vec![
        sources.get("").await,
        sources.delete("   ").await,
        sources.get_table("s1", "").await,
        sources
            .submit_job("", &SourceJob::new(SourceJobType::IngestTable))
            .await,
        pipelines.build("d1", "").await,
        pipelines.list_nodes("", "p1", "v1").await,
        workflows.trigger("d1", "").await,
        workflows.wait_for_run("d1", "w1", "").await,
        jobs.cancel_job("").await,
        domains.attach_sources("d1", &[]).await,
        replicator.trigger_replication("").await,
    ];

    for envelope in envelopes {
        assert_eq!(envelope.error_code(), ErrorCode::Validation, "{envelope:?}");
    }
}

#[tokio::test]
async fn test_source_job_submit_and_wait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/sources/s1/jobs"))
        .and(body_json(json!({
            "job_type": "source_structure_fetch",
            "compute_id": "compute-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "job-9", "status": "pending"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/sources/s1/jobs/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "job-9", "status": "completed"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_with_defaults(&mock_server));
    let envelope = sources
        .run_job("s1", &SourceJob::new(SourceJobType::SourceStructureFetch))
        .await;

    assert!(envelope.is_success(), "{envelope:?}");
    assert_eq!(envelope.job_id(), Some("job-9"));
}

#[tokio::test]
async fn test_source_tables_are_paginated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/sources/s1/tables"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "t3"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/sources/s1/tables"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "t1"}, {"id": "t2"}],
            "links": {"next": "/v3/sources/s1/tables?offset=2"}
        })))
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_for(&mock_server));
    let envelope = sources
        .list_tables("s1", &ListParams::new().limit(2))
        .await;

    assert!(envelope.is_success(), "{envelope:?}");
    assert_eq!(
        envelope.response(),
        &json!([{"id": "t1"}, {"id": "t2"}, {"id": "t3"}])
    );
}

#[tokio::test]
async fn test_source_update_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v3/sources/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such source"})))
        .mount(&mock_server)
        .await;

    let sources = SourcesApi::new(api_for(&mock_server));
    let envelope = sources.update("missing", json!({"name": "x"})).await;

    assert_eq!(envelope.error_code(), ErrorCode::NotFound);
}

// ============================================================================
// Pipelines, domains, workflows, replicator
// ============================================================================

#[tokio::test]
async fn test_pipeline_build_returns_job_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/domains/d1/pipelines/p1/jobs"))
        .and(body_json(json!({"job_type": "pipeline_build"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "build-1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipelines = PipelinesApi::new(api_for(&mock_server));
    let envelope = pipelines.build("d1", "p1").await;

    assert!(envelope.is_success());
    assert_eq!(envelope.job_id(), Some("build-1"));
}

#[tokio::test]
async fn test_domain_attach_sources_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/domains/d1/sources"))
        .and(body_json(json!({"entity_ids": ["s1", "s2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"message": "ok"}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let domains = DomainsApi::new(api_for(&mock_server));
    let envelope = domains
        .attach_sources("d1", &["s1".to_string(), "s2".to_string()])
        .await;

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_workflow_trigger_and_wait_for_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/domains/d1/workflows/w1/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"workflow_run_id": "run-5", "id": "w1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/domains/d1/workflows/w1/runs/run-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"workflow_status": {"state": "running"}}
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/domains/d1/workflows/w1/runs/run-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"workflow_status": {"state": "completed"}}
        })))
        .mount(&mock_server)
        .await;

    let workflows = WorkflowsApi::new(api_for(&mock_server));
    let triggered = workflows.trigger("d1", "w1").await;
    assert_eq!(triggered.job_id(), Some("run-5"));

    let finished = workflows.wait_for_run("d1", "w1", "run-5").await;
    assert!(finished.is_success(), "{finished:?}");
    assert_eq!(finished.job_id(), Some("run-5"));
}

#[tokio::test]
async fn test_replication_job_failure_surfaces() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/replicator/definitions/r1/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "j1", "status": "aborted"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let replicator = ReplicatorApi::new(api_for(&mock_server));
    let envelope = replicator.wait_for_job("r1", "j1").await;

    assert_eq!(envelope.error_code(), ErrorCode::JobFailed);
    assert_eq!(envelope.job_id(), Some("j1"));
}

// ============================================================================
// Jobs and admin
// ============================================================================

#[tokio::test]
async fn test_cancel_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/admin/jobs/j1/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": "j1", "status": "canceled"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let jobs = JobsApi::new(api_for(&mock_server));
    let envelope = jobs.cancel_job("j1").await;

    assert!(envelope.is_success());
    assert_eq!(envelope.job_id(), Some("j1"));
    assert_eq!(envelope.response()["status"], "canceled");
}

#[tokio::test]
async fn test_resolve_defaults_by_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/admin/manage-environments"))
        .and(query_param("filter", r#"{"name":"dev"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "env-7", "name": "dev"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/admin/manage-environments/env-7/environment-storage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "st-1", "name": "other"}, {"id": "st-2", "name": "lake"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/admin/manage-environments/env-7/environment-compute-template"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "cmp-3", "name": "small"}]
        })))
        .mount(&mock_server)
        .await;

    let admin = AdminApi::new(api_for(&mock_server));
    let envelope = admin
        .resolve_defaults(&DefaultNames {
            environment: "dev".to_string(),
            storage: Some("lake".to_string()),
            compute: Some("small".to_string()),
        })
        .await;

    assert!(envelope.is_success(), "{envelope:?}");
    assert_eq!(
        DefaultIds::from_envelope(&envelope).unwrap(),
        DefaultIds {
            environment_id: "env-7".to_string(),
            storage_id: Some("st-2".to_string()),
            compute_id: Some("cmp-3".to_string()),
        }
    );
}

#[tokio::test]
async fn test_resolve_defaults_unknown_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/admin/manage-environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .mount(&mock_server)
        .await;

    let admin = AdminApi::new(api_for(&mock_server));
    let envelope = admin
        .resolve_defaults(&DefaultNames {
            environment: "prod".to_string(),
            ..DefaultNames::default()
        })
        .await;

    assert_eq!(envelope.error_code(), ErrorCode::NotFound);
}
