//! Single-process broker and result store.
//!
//! Messages are stored as serialized JSON so that the same encode/decode
//! boundary is crossed as with a networked broker.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use jobwire_core::types::JobId;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;

use crate::error::BrokerError;
use crate::message::{JobMessage, TaskRecord, TaskRequest};
use crate::{Broker, ResultStore};

#[derive(Debug)]
struct StoredRecord {
    record: TaskRecord,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct MemoryBroker {
    queue: Mutex<VecDeque<String>>,
    ready: Notify,
    records: RwLock<HashMap<JobId, StoredRecord>>,
    result_expires: Duration,
}

impl MemoryBroker {
    pub fn new(result_expires: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
            records: RwLock::new(HashMap::new()),
            result_expires,
        }
    }

    /// Number of messages waiting to be received.
    pub async fn queued(&self) -> usize {
        self.queue.lock().await.len()
    }

    async fn put_record(&self, id: &JobId, record: TaskRecord) -> Result<(), BrokerError> {
        let mut records = self.records.write().await;
        let now = Instant::now();
        // Sweep on every write so records nobody polls still leave the map.
        records.retain(|_, stored| stored.expires_at > now);
        if let Some(existing) = records.get(id) {
            if existing.expires_at > now && existing.record.is_terminal() {
                return Err(BrokerError::AlreadyTerminal(id.clone()));
            }
        }
        records.insert(
            id.clone(),
            StoredRecord {
                record,
                expires_at: now + self.result_expires,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn send(&self, request: TaskRequest) -> Result<JobId, BrokerError> {
        let id = JobId::generate();
        let message = JobMessage::new(id.clone(), request);
        let payload = serde_json::to_string(&message)?;

        self.put_record(&id, TaskRecord::pending()).await?;
        self.queue.lock().await.push_back(payload);
        self.ready.notify_one();

        tracing::debug!(job_id = %id, "Job enqueued");
        Ok(id)
    }

    async fn receive(&self, wait: Duration) -> Result<Option<JobMessage>, BrokerError> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.ready.notified();
            if let Some(payload) = self.queue.lock().await.pop_front() {
                return Ok(Some(serde_json::from_str(&payload)?));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryBroker {
    async fn fetch(&self, id: &JobId) -> Result<Option<TaskRecord>, BrokerError> {
        {
            let records = self.records.read().await;
            match records.get(id) {
                None => return Ok(None),
                Some(stored) if stored.expires_at > Instant::now() => {
                    return Ok(Some(stored.record.clone()));
                }
                Some(_) => {}
            }
        }
        self.records.write().await.remove(id);
        Ok(None)
    }

    async fn store(&self, id: &JobId, record: TaskRecord) -> Result<(), BrokerError> {
        self.put_record(id, record).await
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}
