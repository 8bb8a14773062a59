//! Messages carried by the queue and records kept in the result store.

use std::collections::BTreeMap;

use jobwire_core::codec::TaggedValue;
use jobwire_core::envelope::Domain;
use jobwire_core::job::{
    Job, JobOutput, PENDING_STATUS, STATE_FAILURE, STATE_PENDING, STATE_STARTED, STATE_SUCCESS,
};
use jobwire_core::types::{JobId, Timestamp};
use serde::{Deserialize, Serialize};

/// Status text attached to a job a worker has picked up.
pub const STARTED_STATUS: &str = "Task is being processed";

/// Operation identity plus canonical (re-encoded) arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub domain: Domain,
    pub operation: String,
    #[serde(default)]
    pub args: Vec<TaggedValue>,
    #[serde(default)]
    pub kwargs: BTreeMap<String, TaggedValue>,
}

/// What travels through the queue: the request plus its broker-issued id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub id: JobId,
    pub submitted_at: Timestamp,
    #[serde(flatten)]
    pub request: TaskRequest,
}

impl JobMessage {
    pub fn new(id: JobId, request: TaskRequest) -> Self {
        Self {
            id,
            submitted_at: chrono::Utc::now(),
            request,
        }
    }

    pub fn job(&self) -> Job {
        Job {
            id: self.id.clone(),
            domain: self.request.domain,
            operation: self.request.operation.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Native result-store record for one job.
///
/// `state` is a free-form string so that intermediate states written by
/// other producers pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    pub updated_at: Timestamp,
}

impl TaskRecord {
    fn with_state(state: &str) -> Self {
        Self {
            state: state.to_string(),
            status: None,
            result: None,
            error: None,
            traceback: None,
            updated_at: chrono::Utc::now(),
        }
    }

    pub fn pending() -> Self {
        Self {
            status: Some(PENDING_STATUS.to_string()),
            ..Self::with_state(STATE_PENDING)
        }
    }

    pub fn started() -> Self {
        Self {
            status: Some(STARTED_STATUS.to_string()),
            ..Self::with_state(STATE_STARTED)
        }
    }

    pub fn success(output: JobOutput) -> Self {
        Self {
            result: Some(output),
            ..Self::with_state(STATE_SUCCESS)
        }
    }

    pub fn failure(error: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            traceback: Some(traceback.into()),
            ..Self::with_state(STATE_FAILURE)
        }
    }

    /// `SUCCESS` and `FAILURE` records are final.
    pub fn is_terminal(&self) -> bool {
        self.state == STATE_SUCCESS || self.state == STATE_FAILURE
    }
}
