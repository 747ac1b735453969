//! Shared request shapes for resource clients
//!
//! Nearly every platform endpoint is one of: fetch an entity, list a
//! collection, create an entity, change or delete it, or submit a job.
//! [`ResourceApi`] implements each shape once; resource clients only supply
//! paths and payloads.

use crate::envelope::{Envelope, ErrorCode};
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpClient, RequestConfig};
use crate::jobs::{JobPoller, PollConfig};
use crate::pagination::{list_all, ListParams};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Return a failure envelope from the enclosing function on `Err`
macro_rules! envelope_try {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return $crate::envelope::Envelope::from_error(&err),
        }
    };
}
pub(crate) use envelope_try;

/// Reject empty identifiers before any request is made
pub fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed)
}

/// Extract an identifier from a `result` object (`id`, then `_id`, then `job_id`)
pub fn result_id(result: &Value) -> Option<String> {
    ["id", "_id", "job_id"]
        .iter()
        .filter_map(|key| result.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Fill keys that are missing from a JSON object body
pub fn fill_defaults(body: &mut Value, defaults: &[(&str, Option<&String>)]) {
    if let Value::Object(map) = body {
        for (key, value) in defaults {
            if let Some(value) = value {
                map.entry(*key)
                    .or_insert_with(|| Value::String((*value).clone()));
            }
        }
    }
}

/// Generic request shapes over a shared dispatcher
#[derive(Debug, Clone)]
pub struct ResourceApi {
    client: Arc<HttpClient>,
    poll: PollConfig,
}

impl ResourceApi {
    pub fn new(client: Arc<HttpClient>, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn shared_client(&self) -> Arc<HttpClient> {
        Arc::clone(&self.client)
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Fetch one entity; the envelope's response is the `result` object
    pub async fn get_entity(&self, path: &str) -> Envelope {
        let response = envelope_try!(self.client.get(path).await);
        single_result(path, response, |id, result| {
            Envelope::success_with_entity(id, result)
        })
    }

    /// Fetch an endpoint whose body is returned as-is
    pub async fn get_raw(&self, path: &str, params: &ListParams) -> Envelope {
        let response = envelope_try!(
            self.client
                .get_with_config(path, params.to_request_config())
                .await
        );
        Envelope::from_api_response(response)
    }

    /// List every record of a collection
    pub async fn list(&self, path: &str, params: &ListParams) -> Envelope {
        list_all(&self.client, path, params).await
    }

    /// Create an entity; success requires the server to return its id
    pub async fn create(&self, path: &str, body: Value) -> Envelope {
        let response = envelope_try!(self.client.post(path, body).await);
        single_result(path, response, |id, result| {
            Envelope::success_with_entity(id, result)
        })
    }

    /// Change an entity with PATCH or PUT
    pub async fn update(&self, method: Method, path: &str, body: Value) -> Envelope {
        let response = envelope_try!(
            self.client
                .request(method, path, RequestConfig::new().json(body))
                .await
        );
        ok_with_result(response)
    }

    /// Delete an entity
    pub async fn delete(&self, path: &str) -> Envelope {
        let response = envelope_try!(self.client.delete(path).await);
        ok_with_result(response)
    }

    /// POST a body where any 2xx answer counts as success
    pub async fn post_action(&self, path: &str, body: Value) -> Envelope {
        let response = envelope_try!(self.client.post(path, body).await);
        ok_with_result(response)
    }

    /// Submit a job; success requires the server to return the job id
    pub async fn submit_job(&self, path: &str, body: Value) -> Envelope {
        let response = envelope_try!(self.client.post(path, body).await);
        single_result(path, response, |id, result| {
            debug!("Submitted job {} via {}", id, path);
            Envelope::success_with_job(id, result)
        })
    }

    /// Wait for a job using this resource's poll settings
    pub async fn wait(&self, job_id: &str, status_path: &str) -> Envelope {
        JobPoller::new(&self.client, self.poll.clone())
            .poll(job_id, status_path)
            .await
    }

    /// Wait for a job with a status found at a different JSON pointer
    pub async fn wait_with_pointer(
        &self,
        job_id: &str,
        status_path: &str,
        pointer: &str,
    ) -> Envelope {
        let config = self.poll.clone().status_pointer(pointer);
        JobPoller::new(&self.client, config)
            .poll(job_id, status_path)
            .await
    }
}

/// Success needs a 2xx status and a `result` carrying an id
fn single_result(
    path: &str,
    response: ApiResponse,
    on_success: impl FnOnce(String, Value) -> Envelope,
) -> Envelope {
    if !response.is_success() {
        return Envelope::from_api_response(response);
    }
    let Some(result) = response.result().cloned() else {
        return Envelope::failure(
            ErrorCode::MissingResult,
            Error::missing_result(path, "result").to_string(),
            response.body,
        );
    };
    match result_id(&result) {
        Some(id) => on_success(id, result),
        None => Envelope::failure(
            ErrorCode::MissingResult,
            Error::missing_result(path, "result.id").to_string(),
            response.body,
        ),
    }
}

/// Success on any 2xx; the response is `result` when present, else the body
fn ok_with_result(response: ApiResponse) -> Envelope {
    if !response.is_success() {
        return Envelope::from_api_response(response);
    }
    let entity_id = response.result().and_then(result_id);
    let payload = response
        .result()
        .cloned()
        .unwrap_or(response.body);
    let envelope = Envelope::success(payload);
    match entity_id {
        Some(id) => envelope.with_entity_id(id),
        None => envelope,
    }
}

#[cfg(test)]
mod base_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("source_id", " abc ").unwrap(), "abc");
        let err = require_id("source_id", "").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "source_id"));
    }

    #[test]
    fn test_result_id_variants() {
        assert_eq!(result_id(&json!({"id": "a"})).as_deref(), Some("a"));
        assert_eq!(result_id(&json!({"_id": "b"})).as_deref(), Some("b"));
        assert_eq!(result_id(&json!({"job_id": 42})).as_deref(), Some("42"));
        assert_eq!(result_id(&json!({"id": ""})), None);
        assert_eq!(result_id(&json!({"name": "x"})), None);
    }

    #[test]
    fn test_fill_defaults_keeps_explicit_values() {
        let env = "env-default".to_string();
        let storage = "storage-default".to_string();
        let mut body = json!({"name": "s", "environment_id": "env-explicit"});
        fill_defaults(
            &mut body,
            &[
                ("environment_id", Some(&env)),
                ("storage_id", Some(&storage)),
                ("compute_id", None),
            ],
        );

        assert_eq!(
            body,
            json!({
                "name": "s",
                "environment_id": "env-explicit",
                "storage_id": "storage-default"
            })
        );
    }

    #[test]
    fn test_single_result_requires_id() {
        let env = single_result(
            "/v3/sources",
            ApiResponse::new(200, json!({"result": {"name": "x"}})),
            |id, r| Envelope::success_with_entity(id, r),
        );
        assert_eq!(env.error_code(), ErrorCode::MissingResult);

        let env = single_result(
            "/v3/sources",
            ApiResponse::new(201, json!({"result": {"id": "s9"}})),
            |id, r| Envelope::success_with_entity(id, r),
        );
        assert_eq!(env.entity_id(), Some("s9"));
    }

    #[test]
    fn test_ok_with_result_falls_back_to_body() {
        let env = ok_with_result(ApiResponse::new(204, Value::Null));
        assert!(env.is_success());
        assert_eq!(env.response(), &Value::Null);

        let env = ok_with_result(ApiResponse::new(409, json!({"message": "in use"})));
        assert_eq!(env.error_code(), ErrorCode::Validation);
    }
}
