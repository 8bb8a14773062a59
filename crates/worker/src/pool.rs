//! Worker pool: concurrent slots pulling jobs from the broker.
//!
//! Each slot loops `receive -> STARTED -> execute -> terminal record` until
//! the cancellation token fires. Execution runs on the blocking thread pool
//! so CPU-bound operations never stall the runtime.

use std::any::Any;
use std::sync::Arc;

use jobwire_broker::{Broker, BrokerError, JobMessage, ResultStore, TaskRecord};
use jobwire_ops::OperationRegistry;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::executor::{execute, job_header};

#[derive(Clone)]
pub struct WorkerPool {
    broker: Arc<dyn Broker>,
    store: Arc<dyn ResultStore>,
    registry: Arc<OperationRegistry>,
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(
        broker: Arc<dyn Broker>,
        store: Arc<dyn ResultStore>,
        registry: Arc<OperationRegistry>,
        config: PoolConfig,
    ) -> Self {
        Self {
            broker,
            store,
            registry,
            config,
        }
    }

    /// Run all slots until `cancel` is triggered. In-flight jobs finish
    /// before this returns.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            slots = self.config.slots,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Worker pool started",
        );

        let mut slots = JoinSet::new();
        for slot in 0..self.config.slots {
            let pool = self.clone();
            let cancel = cancel.clone();
            slots.spawn(async move { pool.run_slot(slot, cancel).await });
        }
        while let Some(joined) = slots.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker slot terminated abnormally");
            }
        }

        tracing::info!("Worker pool stopped");
    }

    async fn run_slot(&self, slot: usize, cancel: CancellationToken) {
        // `receive` is not cancel-safe: a networked broker may already have
        // popped the message. It is bounded by `poll_interval`, so the token
        // is only checked between receives.
        while !cancel.is_cancelled() {
            let received = self.broker.receive(self.config.poll_interval).await;

            match received {
                Ok(Some(message)) => self.process(message).await,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(slot, error = %e, "Failed to receive job");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.retry_backoff) => {}
                    }
                }
            }
        }
    }

    /// Execute one message and write its terminal record.
    pub async fn process(&self, message: JobMessage) {
        let id = message.id.clone();

        match self.store.store(&id, TaskRecord::started()).await {
            Ok(()) => {}
            Err(BrokerError::AlreadyTerminal(_)) => {
                tracing::warn!(job_id = %id, "Job already finished, skipping redelivery");
                return;
            }
            Err(e) => tracing::warn!(job_id = %id, error = %e, "Failed to mark job started"),
        }

        tracing::info!(
            job_id = %id,
            domain = %message.request.domain,
            operation = %message.request.operation,
            "Job started",
        );

        let header = job_header(&message);
        let registry = Arc::clone(&self.registry);
        let record = match tokio::task::spawn_blocking(move || execute(&registry, &message)).await
        {
            Ok(record) => record,
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                TaskRecord::failure(
                    format!("Worker panicked: {reason}"),
                    format!("{header}Panic: {reason}\n"),
                )
            }
        };

        match &record.error {
            None => tracing::info!(
                job_id = %id,
                elapsed = record.result.as_ref().map(|r| r.elapsed),
                "Job succeeded",
            ),
            Some(error) => tracing::warn!(job_id = %id, error = %error, "Job failed"),
        }

        if let Err(e) = self.store.store(&id, record).await {
            tracing::error!(job_id = %id, error = %e, "Failed to store job result");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
