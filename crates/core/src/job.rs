//! Job model and lifecycle states.
//!
//! A job moves `PENDING -> (RUNNING/other) -> SUCCESS | FAILURE`. Only the
//! worker that executes the job writes its state; everybody else reads.

use serde::{Deserialize, Serialize};

use crate::codec::TaggedValue;
use crate::envelope::Domain;
use crate::types::{JobId, Timestamp};

/// Native state: accepted, not picked up by a worker yet.
pub const STATE_PENDING: &str = "PENDING";

/// Native state: a worker has started executing the job.
pub const STATE_STARTED: &str = "STARTED";

/// Native state: the job finished and carries an encoded result.
pub const STATE_SUCCESS: &str = "SUCCESS";

/// Native state: the job finished with an error and a trace.
pub const STATE_FAILURE: &str = "FAILURE";

/// Human-readable status attached to a pending job.
pub const PENDING_STATUS: &str = "Task is waiting to be processed";

/// A submitted job. Created once on successful submission, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub domain: Domain,
    pub operation: String,
    pub submitted_at: Timestamp,
}

/// Successful job result as stored in the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Encoded return value of the operation.
    pub output: TaggedValue,
    /// Wall-clock execution time in seconds, rounded to 4 decimals.
    pub elapsed: f64,
    pub finish_time: Timestamp,
}

/// Client-facing lifecycle state of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    /// In progress, or any intermediate state a backend reports that this
    /// model does not name. The native state string is passed through.
    Running { state: String, status: String },
    Success(JobOutput),
    Failure { error: String, traceback: String },
}

impl JobState {
    /// State name as reported to clients.
    pub fn name(&self) -> &str {
        match self {
            JobState::Pending => STATE_PENDING,
            JobState::Running { state, .. } => state,
            JobState::Success(_) => STATE_SUCCESS,
            JobState::Failure { .. } => STATE_FAILURE,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success(_) | JobState::Failure { .. })
    }

    /// Project a backend's native record onto the client-facing state.
    ///
    /// `SUCCESS` without a result is reported as a failure. Unnamed native
    /// states pass through as [`JobState::Running`], using the state name
    /// as status when the backend gave none.
    pub fn from_native(
        state: String,
        status: Option<String>,
        result: Option<JobOutput>,
        error: Option<String>,
        traceback: Option<String>,
    ) -> JobState {
        match state.as_str() {
            STATE_PENDING => JobState::Pending,
            STATE_SUCCESS => match result {
                Some(output) => JobState::Success(output),
                None => JobState::Failure {
                    error: "Job reported success without a result".to_string(),
                    traceback: String::new(),
                },
            },
            STATE_FAILURE => JobState::Failure {
                error: error.unwrap_or_default(),
                traceback: traceback.unwrap_or_default(),
            },
            _ => JobState::Running {
                status: status.unwrap_or_else(|| state.clone()),
                state,
            },
        }
    }
}

/// Round an elapsed duration in seconds to 4 decimal places.
pub fn round_elapsed(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
