//! Job submission gateway.
//!
//! Decode-then-submit: arguments are decoded through the codec before
//! anything is enqueued, so malformed payloads are rejected synchronously
//! with a 4xx instead of surfacing later as a job failure. The decoded
//! values are re-encoded into canonical wire form for transport.

use std::sync::Arc;

use jobwire_broker::{Broker, BrokerError, TaskRequest};
use jobwire_core::codec;
use jobwire_core::envelope::RequestEnvelope;
use jobwire_core::error::CodecError;
use jobwire_core::job::Job;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The decoded arguments cannot be expressed in canonical wire form,
    /// e.g. a payload of an unrecognized kind.
    #[error("Arguments cannot be serialized for transport: {0}")]
    Unserializable(String),

    #[error(transparent)]
    BrokerUnavailable(BrokerError),

    #[error("Submission task failed: {0}")]
    Internal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    InvalidEnvelope(#[from] CodecError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl From<BrokerError> for SubmissionError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Serialize(e) => SubmissionError::Unserializable(e.to_string()),
            other => SubmissionError::BrokerUnavailable(other),
        }
    }
}

pub struct JobGateway {
    broker: Arc<dyn Broker>,
}

impl JobGateway {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Decode, canonicalize and enqueue. Returns as soon as the broker has
    /// accepted the job; never waits for execution.
    pub async fn submit(&self, envelope: RequestEnvelope) -> Result<Job, GatewayError> {
        // Image decoding is CPU-bound.
        let request = tokio::task::spawn_blocking(move || canonicalize(envelope))
            .await
            .map_err(|e| SubmissionError::Internal(e.to_string()))??;

        let domain = request.domain;
        let operation = request.operation.clone();
        let id = self
            .broker
            .send(request)
            .await
            .map_err(SubmissionError::from)?;

        tracing::info!(job_id = %id, %domain, operation = %operation, "Job submitted");
        Ok(Job {
            id,
            domain,
            operation,
            submitted_at: chrono::Utc::now(),
        })
    }
}

/// Decode every argument, then re-encode to canonical form.
pub fn canonicalize(envelope: RequestEnvelope) -> Result<TaskRequest, GatewayError> {
    let args = codec::decode_args(&envelope.args)?;
    let kwargs = codec::decode_kwargs(&envelope.kwargs)?;

    let unserializable = |e: CodecError| SubmissionError::Unserializable(e.to_string());
    let args = codec::encode_args(&args).map_err(unserializable)?;
    let kwargs = codec::encode_kwargs(&kwargs).map_err(unserializable)?;

    Ok(TaskRequest {
        domain: envelope.domain,
        operation: envelope.operation,
        args,
        kwargs,
    })
}
