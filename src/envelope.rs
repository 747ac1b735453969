//! Uniform response envelope
//!
//! Every public operation returns an [`Envelope`], on success and on
//! failure alike, so callers can match on one shape:
//!
//! ```json
//! {
//!   "error":  { "error_code": "NONE", "error_desc": "" },
//!   "result": { "status": "success", "job_id": null, "entity_id": "64f...", "response": {} }
//! }
//! ```

use crate::error::Error;
use crate::http::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No error
    #[default]
    None,
    /// Server answered with something unexpected
    Generic,
    /// Caller-supplied argument was rejected before any request was made
    Validation,
    /// Bearer token could not be obtained or was rejected
    Unauthorized,
    /// Entity does not exist
    NotFound,
    /// Server-side failure (5xx)
    Server,
    /// Network-level failure
    Transport,
    /// Response lacked the expected `result`/`id` field
    MissingResult,
    /// Operation or poll did not finish in time
    Timeout,
    /// Poll retries exhausted
    RetryExhausted,
    /// Remote job reached a non-successful terminal state
    JobFailed,
}

impl ErrorCode {
    /// Map an HTTP status to an error code
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ErrorCode::None,
            400 | 409 | 422 => ErrorCode::Validation,
            401 | 403 | 406 => ErrorCode::Unauthorized,
            404 => ErrorCode::NotFound,
            500..=599 => ErrorCode::Server,
            _ => ErrorCode::Generic,
        }
    }

    /// Map a client error to an error code
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Validation { .. } | Error::Config { .. } | Error::MissingConfigField { .. } => {
                ErrorCode::Validation
            }
            Error::TokenRefresh { .. } => ErrorCode::Unauthorized,
            Error::HttpStatus { status, .. } => ErrorCode::from_status(*status),
            Error::Http(_) | Error::InvalidUrl(_) => ErrorCode::Transport,
            Error::Timeout { .. } | Error::PollTimeout { .. } => ErrorCode::Timeout,
            Error::MissingResult { .. } | Error::JsonParse(_) | Error::PageLimit { .. } => {
                ErrorCode::MissingResult
            }
            Error::PollRetriesExhausted { .. } => ErrorCode::RetryExhausted,
            _ => ErrorCode::Generic,
        }
    }

    /// Wire string for this code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::None => "NONE",
            ErrorCode::Generic => "GENERIC",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Server => "SERVER",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::MissingResult => "MISSING_RESULT",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::RetryExhausted => "RETRY_EXHAUSTED",
            ErrorCode::JobFailed => "JOB_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error half of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error_code: ErrorCode,
    pub error_desc: String,
}

/// Result half of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetail {
    pub status: Status,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub response: Value,
}

/// The uniform result record returned by every public operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub error: ErrorDetail,
    pub result: ResultDetail,
}

impl Envelope {
    fn build(
        status: Status,
        code: ErrorCode,
        desc: String,
        job_id: Option<String>,
        entity_id: Option<String>,
        response: Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                error_code: code,
                error_desc: desc,
            },
            result: ResultDetail {
                status,
                job_id,
                entity_id,
                response,
            },
        }
    }

    /// Successful outcome carrying a payload
    pub fn success(response: Value) -> Self {
        Self::build(
            Status::Success,
            ErrorCode::None,
            String::new(),
            None,
            None,
            response,
        )
    }

    /// Successful outcome for a submitted or finished job
    pub fn success_with_job(job_id: impl Into<String>, response: Value) -> Self {
        Self::build(
            Status::Success,
            ErrorCode::None,
            String::new(),
            Some(job_id.into()),
            None,
            response,
        )
    }

    /// Successful outcome for a created or addressed entity
    pub fn success_with_entity(entity_id: impl Into<String>, response: Value) -> Self {
        Self::build(
            Status::Success,
            ErrorCode::None,
            String::new(),
            None,
            Some(entity_id.into()),
            response,
        )
    }

    /// Failed outcome
    pub fn failure(code: ErrorCode, desc: impl Into<String>, response: Value) -> Self {
        Self::build(Status::Failed, code, desc.into(), None, None, response)
    }

    /// Failed outcome tied to a job
    pub fn job_failure(
        code: ErrorCode,
        job_id: impl Into<String>,
        desc: impl Into<String>,
        response: Value,
    ) -> Self {
        Self::build(
            Status::Failed,
            code,
            desc.into(),
            Some(job_id.into()),
            None,
            response,
        )
    }

    /// Fold a client error into a failure envelope
    pub fn from_error(error: &Error) -> Self {
        let response = match error {
            Error::HttpStatus { body, .. } => serde_json::from_str(body)
                .unwrap_or_else(|_| Value::String(body.clone())),
            _ => Value::Null,
        };
        Self::failure(ErrorCode::from_error(error), error.to_string(), response)
    }

    /// 2xx responses become success envelopes, anything else a failure
    pub fn from_api_response(response: ApiResponse) -> Self {
        if response.is_success() {
            return Self::success(response.body);
        }
        let desc = response
            .message()
            .unwrap_or_else(|| format!("request failed with HTTP {}", response.status));
        Self::failure(ErrorCode::from_status(response.status), desc, response.body)
    }

    /// Attach an entity id
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.result.entity_id = Some(entity_id.into());
        self
    }

    /// Attach a job id
    #[must_use]
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.result.job_id = Some(job_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.result.status == Status::Success
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error.error_code
    }

    pub fn job_id(&self) -> Option<&str> {
        self.result.job_id.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.result.entity_id.as_deref()
    }

    pub fn response(&self) -> &Value {
        &self.result.response
    }

    /// Convert to a `Result`, yielding the payload on success
    pub fn into_result(self) -> crate::error::Result<Value> {
        match self.result.status {
            Status::Success => Ok(self.result.response),
            Status::Failed => Err(Error::Other(format!(
                "{}: {}",
                self.error.error_code, self.error.error_desc
            ))),
        }
    }
}

impl From<Error> for Envelope {
    fn from(error: Error) -> Self {
        Self::from_error(&error)
    }
}

impl From<crate::error::Result<Envelope>> for Envelope {
    fn from(result: crate::error::Result<Envelope>) -> Self {
        result.unwrap_or_else(|e| Self::from_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let env = Envelope::success_with_entity("64f0", json!({"id": "64f0"}));
        assert!(env.is_success());
        assert_eq!(env.error_code(), ErrorCode::None);
        assert_eq!(env.entity_id(), Some("64f0"));
        assert!(env.job_id().is_none());

        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({
                "error": {"error_code": "NONE", "error_desc": ""},
                "result": {
                    "status": "success",
                    "job_id": null,
                    "entity_id": "64f0",
                    "response": {"id": "64f0"}
                }
            })
        );
    }

    #[test]
    fn test_failure_from_error() {
        let env = Envelope::from_error(&Error::validation("source_id", "must not be empty"));
        assert!(env.is_failure());
        assert_eq!(env.error_code(), ErrorCode::Validation);
        assert!(env.error.error_desc.contains("source_id"));

        let env = Envelope::from_error(&Error::http_status(404, r#"{"message":"gone"}"#));
        assert_eq!(env.error_code(), ErrorCode::NotFound);
        assert_eq!(env.response(), &json!({"message": "gone"}));

        let env = Envelope::from_error(&Error::PollRetriesExhausted {
            job_id: "j1".into(),
            failures: 3,
        });
        assert_eq!(env.error_code(), ErrorCode::RetryExhausted);
    }

    #[test]
    fn test_from_api_response() {
        let ok = Envelope::from_api_response(ApiResponse::new(200, json!({"result": []})));
        assert!(ok.is_success());

        let failed = Envelope::from_api_response(ApiResponse::new(
            500,
            json!({"message": "database unavailable"}),
        ));
        assert_eq!(failed.error_code(), ErrorCode::Server);
        assert_eq!(failed.error.error_desc, "database unavailable");

        let failed = Envelope::from_api_response(ApiResponse::new(418, Value::Null));
        assert_eq!(failed.error_code(), ErrorCode::Generic);
        assert_eq!(failed.error.error_desc, "request failed with HTTP 418");
    }

    #[test]
    fn test_into_result() {
        let value = Envelope::success(json!([1, 2])).into_result().unwrap();
        assert_eq!(value, json!([1, 2]));

        let err = Envelope::failure(ErrorCode::Timeout, "too slow", Value::Null)
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "TIMEOUT: too slow");
    }
}
