//! Job lifecycle tracker: a read-only projection of the result store.
//!
//! Querying never changes state, so the same terminal answer is returned
//! no matter how often a client polls.

use std::sync::Arc;

use jobwire_broker::{BrokerError, ResultStore, TaskRecord};
use jobwire_core::job::JobState;
use jobwire_core::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Never submitted, or the record has expired.
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Result store unavailable: {0}")]
    StoreUnavailable(#[from] BrokerError),
}

pub struct JobTracker {
    store: Arc<dyn ResultStore>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    pub async fn query(&self, id: &JobId) -> Result<JobState, TrackerError> {
        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(id.clone()))?;
        Ok(project(record))
    }
}

/// Map a native record onto the client-facing state.
pub fn project(record: TaskRecord) -> JobState {
    JobState::from_native(
        record.state,
        record.status,
        record.result,
        record.error,
        record.traceback,
    )
}
