use std::sync::Arc;

use jobwire_broker::{Backend, Broker, ResultStore};

use crate::config::ServerConfig;
use crate::engine::{JobGateway, JobTracker};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub gateway: Arc<JobGateway>,
    pub tracker: Arc<JobTracker>,
    /// Kept for health checks.
    pub broker: Arc<dyn Broker>,
    pub store: Arc<dyn ResultStore>,
}

impl AppState {
    pub fn new(config: ServerConfig, backend: &Backend) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(JobGateway::new(Arc::clone(&backend.broker))),
            tracker: Arc::new(JobTracker::new(Arc::clone(&backend.store))),
            broker: Arc::clone(&backend.broker),
            store: Arc::clone(&backend.store),
        }
    }
}
