use jobwire_core::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The transport or store could not be reached. Callers may retry.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A job's terminal record is final and is never overwritten.
    #[error("Job {0} already has a terminal record")]
    AlreadyTerminal(JobId),

    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<::redis::RedisError> for BrokerError {
    fn from(err: ::redis::RedisError) -> Self {
        BrokerError::Unavailable(err.to_string())
    }
}
