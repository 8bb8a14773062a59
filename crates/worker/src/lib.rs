//! Job execution: the pure [`executor`] and the async [`pool`] driving it.

pub mod config;
pub mod executor;
pub mod pool;

pub use config::{BrokerConfig, ConfigError, PoolConfig};
pub use executor::execute;
pub use pool::WorkerPool;
