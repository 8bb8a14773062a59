//! Redis-backed broker and result store.
//!
//! | Key                               | Type   | Purpose                  |
//! |-----------------------------------|--------|--------------------------|
//! | `{prefix}:queue`                  | List   | pending `JobMessage`s    |
//! | `{prefix}:result:{job_id}`        | String | `TaskRecord` JSON, `EX`  |
//!
//! Producers `LPUSH`, workers `BRPOP`, so the list is FIFO.

use std::time::Duration;

use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use jobwire_core::types::JobId;
use tokio::sync::Mutex;

use crate::error::BrokerError;
use crate::message::{JobMessage, TaskRecord, TaskRequest};
use crate::{Broker, ResultStore};

const DEFAULT_PREFIX: &str = "jobwire";

pub struct RedisBroker {
    conn: MultiplexedConnection,
    /// Dedicated connection for `BRPOP`, which blocks the whole connection
    /// server-side.
    blocking: Mutex<MultiplexedConnection>,
    prefix: String,
    result_expires: Duration,
}

impl RedisBroker {
    pub async fn connect(url: &str, result_expires: Duration) -> Result<Self, BrokerError> {
        let client = ::redis::Client::open(url).map_err(|e| BrokerError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let conn = client.get_multiplexed_async_connection().await?;
        let blocking = client.get_multiplexed_async_connection().await?;

        tracing::info!(prefix = DEFAULT_PREFIX, "Connected to Redis broker");
        Ok(Self {
            conn,
            blocking: Mutex::new(blocking),
            prefix: DEFAULT_PREFIX.to_string(),
            result_expires,
        })
    }

    /// Use a custom key prefix, e.g. to isolate deployments sharing a server.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn queue_key(&self) -> String {
        format!("{}:queue", self.prefix)
    }

    fn result_key(&self, id: &JobId) -> String {
        format!("{}:result:{}", self.prefix, id)
    }

    fn expires_secs(&self) -> u64 {
        self.result_expires.as_secs().max(1)
    }

    async fn ping(&self) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let _: bool = conn.exists(self.queue_key()).await?;
        Ok(())
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn send(&self, request: TaskRequest) -> Result<JobId, BrokerError> {
        let id = JobId::generate();
        let message = JobMessage::new(id.clone(), request);
        let payload = serde_json::to_string(&message)?;
        let pending = serde_json::to_string(&TaskRecord::pending())?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.result_key(&id), pending, self.expires_secs())
            .await?;
        let _: i64 = conn.lpush(self.queue_key(), payload).await?;

        tracing::debug!(job_id = %id, "Job enqueued");
        Ok(id)
    }

    async fn receive(&self, wait: Duration) -> Result<Option<JobMessage>, BrokerError> {
        let mut conn = self.blocking.lock().await;
        // A zero timeout would block forever.
        let timeout = wait.as_secs_f64().max(0.01);
        let popped: Option<(String, String)> = conn.brpop(self.queue_key(), timeout).await?;
        match popped {
            Some((_, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        self.ping().await
    }
}

#[async_trait]
impl ResultStore for RedisBroker {
    async fn fetch(&self, id: &JobId) -> Result<Option<TaskRecord>, BrokerError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.result_key(id)).await?;
        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(BrokerError::from)
    }

    async fn store(&self, id: &JobId, record: TaskRecord) -> Result<(), BrokerError> {
        let payload = serde_json::to_string(&record)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.result_key(id), payload, self.expires_secs())
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        self.ping().await
    }
}
