//! Job transport and result storage.
//!
//! [`Broker`] moves [`JobMessage`]s from the API to workers; [`ResultStore`]
//! holds the per-job [`TaskRecord`] that workers write and the API reads.
//! Both are object-safe so the API and worker can hold `Arc<dyn ...>` and
//! switch implementation from the `BROKER_URL` scheme alone.

pub mod error;
pub mod memory;
pub mod message;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobwire_core::types::JobId;

pub use error::BrokerError;
pub use memory::MemoryBroker;
pub use message::{JobMessage, TaskRecord, TaskRequest};
pub use self::redis::RedisBroker;

#[async_trait]
pub trait Broker: Send + Sync {
    /// Issue an id, record the job as `PENDING` and enqueue it.
    async fn send(&self, request: TaskRequest) -> Result<JobId, BrokerError>;

    /// Pop the next message, waiting at most `wait`.
    ///
    /// Not cancel-safe: a networked broker may pop the message before the
    /// future completes, so callers must await it to the end.
    async fn receive(&self, wait: Duration) -> Result<Option<JobMessage>, BrokerError>;

    async fn health_check(&self) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// `None` when the job was never submitted or its record has expired.
    async fn fetch(&self, id: &JobId) -> Result<Option<TaskRecord>, BrokerError>;

    async fn store(&self, id: &JobId, record: TaskRecord) -> Result<(), BrokerError>;

    async fn health_check(&self) -> Result<(), BrokerError>;
}

/// Broker and result store resolved from a URL.
#[derive(Clone)]
pub struct Backend {
    pub broker: Arc<dyn Broker>,
    pub store: Arc<dyn ResultStore>,
    /// `true` for `memory://`: only workers in this process can see the queue.
    pub in_process: bool,
}

/// Resolve a backend from `url`.
///
/// - `memory://` gives a fresh [`MemoryBroker`].
/// - `redis://` and `rediss://` connect a [`RedisBroker`].
pub async fn connect(url: &str, result_expires: Duration) -> Result<Backend, BrokerError> {
    let scheme = url.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some("memory") => {
            let memory = Arc::new(MemoryBroker::new(result_expires));
            Ok(Backend {
                broker: memory.clone(),
                store: memory,
                in_process: true,
            })
        }
        Some("redis") | Some("rediss") => {
            let redis = Arc::new(RedisBroker::connect(url, result_expires).await?);
            Ok(Backend {
                broker: redis.clone(),
                store: redis,
                in_process: false,
            })
        }
        _ => Err(BrokerError::InvalidUrl {
            url: url.to_string(),
            reason: "expected memory:// or redis://".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_url_gives_shared_in_process_backend() {
        let backend = connect("memory://", Duration::from_secs(60)).await.unwrap();
        assert!(backend.in_process);

        let id = backend
            .broker
            .send(TaskRequest {
                domain: jobwire_core::envelope::Domain::Text,
                operation: "upper".into(),
                args: vec![],
                kwargs: Default::default(),
            })
            .await
            .unwrap();
        assert!(backend.store.fetch(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_scheme_rejected() {
        for url in ["amqp://localhost", "localhost:6379"] {
            let result = connect(url, Duration::from_secs(60)).await;
            assert!(matches!(result, Err(BrokerError::InvalidUrl { .. })));
        }
    }
}
