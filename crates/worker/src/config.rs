use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Read `name` from the environment, falling back to `default` when unset.
pub fn env_or<T: FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Broker connection settings shared by the API and worker binaries.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// `memory://` or `redis://host:port/db` (default: `memory://`).
    pub url: String,
    /// How long result records are kept (default: 3600 s).
    pub result_expires: Duration,
}

impl BrokerConfig {
    /// | Env Var               | Default     |
    /// |-----------------------|-------------|
    /// | `BROKER_URL`          | `memory://` |
    /// | `RESULT_EXPIRES_SECS` | `3600`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("BROKER_URL").unwrap_or_else(|_| "memory://".into());
        let expires: u64 = env_or("RESULT_EXPIRES_SECS", 3600, "u64")?;
        Ok(Self {
            url,
            result_expires: Duration::from_secs(expires),
        })
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Concurrent job slots per process.
    pub slots: usize,
    /// Longest a slot blocks waiting for a message before re-checking
    /// for shutdown.
    pub poll_interval: Duration,
    /// Pause after a broker error before trying again.
    pub retry_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            slots: 4,
            poll_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl PoolConfig {
    /// | Env Var            | Default |
    /// |--------------------|---------|
    /// | `WORKER_SLOTS`     | `4`     |
    /// | `WORKER_POLL_SECS` | `1`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let slots: usize = env_or("WORKER_SLOTS", defaults.slots, "positive integer")?;
        if slots == 0 {
            return Err(ConfigError::Invalid {
                name: "WORKER_SLOTS",
                expected: "positive integer",
                value: "0".into(),
            });
        }
        let poll_secs: u64 = env_or("WORKER_POLL_SECS", 1, "u64")?;
        Ok(Self {
            slots,
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            ..defaults
        })
    }
}
