//! HTTP client for the jobwire API.
//!
//! Wraps `POST /api/v1/process` and `GET /api/v1/status/{id}` using
//! [`reqwest`]. The protocol has no server-side wait, so [`JobClient::wait`]
//! polls with a caller-chosen interval and deadline.

use std::collections::BTreeMap;
use std::time::Duration;

use jobwire_core::codec::{self, Value};
use jobwire_core::envelope::Domain;
use jobwire_core::error::CodecError;
use jobwire_core::job::{JobOutput, JobState, STATE_FAILURE, STATE_SUCCESS};
use jobwire_core::types::JobId;
use serde::{Deserialize, Serialize};

/// Errors from the client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API rejected the request with its `{status_code, message, error}` body.
    #[error("API error ({status}, code {status_code}): {message}: {error}")]
    Api {
        status: u16,
        status_code: u16,
        message: String,
        error: String,
    },

    /// Non-2xx response without the standard error body.
    #[error("Unexpected response ({status}): {body}")]
    Unexpected { status: u16, body: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Timed out after {waited:?} waiting for job {id}")]
    Timeout { id: JobId, waited: Duration },
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    task_id: JobId,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    status_code: u16,
    message: String,
    #[serde(default)]
    error: String,
}

/// Status report as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        self.state == STATE_SUCCESS || self.state == STATE_FAILURE
    }

    pub fn into_state(self) -> JobState {
        JobState::from_native(
            self.state,
            self.status,
            self.result,
            self.error,
            self.traceback,
        )
    }

    /// Decode the result payload of a successful job.
    pub fn output(&self) -> Option<Result<Value, CodecError>> {
        self.result.as_ref().map(|r| codec::decode(&r.output))
    }
}

/// Client for one jobwire API server.
#[derive(Debug, Clone)]
pub struct JobClient {
    client: reqwest::Client,
    base_url: String,
}

impl JobClient {
    /// * `base_url` - e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Submit a raw request body, as read from a file for example.
    pub async fn submit_raw(&self, body: &serde_json::Value) -> Result<JobId, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v1/process", self.base_url))
            .json(body)
            .send()
            .await?;
        let submitted: SubmitBody = Self::parse_response(response).await?;
        tracing::debug!(job_id = %submitted.task_id, "Job submitted");
        Ok(submitted.task_id)
    }

    /// Encode native arguments and submit `domain.operation`.
    pub async fn submit(
        &self,
        domain: Domain,
        operation: &str,
        args: &[Value],
        kwargs: &BTreeMap<String, Value>,
    ) -> Result<JobId, ClientError> {
        let body = serde_json::json!({
            "domain": domain,
            "operation": operation,
            "parameters": {
                "args": codec::encode_args(args)?,
                "kwargs": codec::encode_kwargs(kwargs)?,
            },
        });
        self.submit_raw(&body).await
    }

    pub async fn status(&self, id: &JobId) -> Result<JobStatus, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/v1/status/{}", self.base_url, id))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Poll until the job is terminal or `timeout` elapses.
    pub async fn wait(
        &self,
        id: &JobId,
        interval: Duration,
        timeout: Duration,
    ) -> Result<JobStatus, ClientError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.status(id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if tokio::time::Instant::now() + interval > deadline {
                return Err(ClientError::Timeout {
                    id: id.clone(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }

    // ---- private helpers ----

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => Err(ClientError::Api {
                status: status.as_u16(),
                status_code: err.status_code,
                message: err.message,
                error: err.error,
            }),
            Err(_) => Err(ClientError::Unexpected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
