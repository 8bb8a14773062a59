//! Response bodies shared by the API handlers.

use jobwire_core::job::{JobOutput, JobState, PENDING_STATUS};
use jobwire_core::types::JobId;
use serde::{Deserialize, Serialize};

pub const SUBMITTED_MESSAGE: &str = "Task submitted successfully";

/// `202 Accepted` body for `POST /api/v1/process`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status_code: u16,
    pub message: String,
    pub task_id: JobId,
}

impl SubmitResponse {
    pub fn accepted(task_id: JobId) -> Self {
        Self {
            status_code: 202,
            message: SUBMITTED_MESSAGE.to_string(),
            task_id,
        }
    }
}

/// Error body: `{status_code, message, error}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}

/// Body of `GET /api/v1/status/{job_id}`.
///
/// Which optional fields are present depends on `state`:
///
/// | state     | fields               |
/// |-----------|----------------------|
/// | `PENDING` | `status`             |
/// | `SUCCESS` | `result`             |
/// | `FAILURE` | `error`, `traceback` |
/// | other     | `status`             |
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
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

impl From<JobState> for StatusResponse {
    fn from(state: JobState) -> Self {
        let mut response = StatusResponse {
            state: state.name().to_string(),
            status: None,
            result: None,
            error: None,
            traceback: None,
        };
        match state {
            JobState::Pending => response.status = Some(PENDING_STATUS.to_string()),
            JobState::Running { status, .. } => response.status = Some(status),
            JobState::Success(output) => response.result = Some(output),
            JobState::Failure { error, traceback } => {
                response.error = Some(error);
                response.traceback = Some(traceback);
            }
        }
        response
    }
}
