//! Engine configuration.

use crate::core::DEFAULT_HISTORY_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound of the threaded engine's trigger queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default wait before the idle worker logs and polls again.
pub const DEFAULT_IDLE_POLL_INTERVAL_MS: u64 = 10_000;

/// Default log tag.
pub const DEFAULT_TAG: &str = "FSM";

/// Tunables shared by [`Engine`](super::Engine) and
/// [`ThreadSafeEngine`](super::ThreadSafeEngine).
///
/// Missing fields take their defaults when deserialized, so a partial
/// document is valid.
///
/// # Example
///
/// ```rust
/// use statecraft::engine::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_queue_capacity(16)
///     .with_worker_name("phone-fsm");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.queue_capacity, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of queued, not yet applied triggers
    pub queue_capacity: usize,

    /// How long the worker waits on an empty queue before logging liveness
    pub idle_poll_interval_ms: u64,

    /// Name given to the worker thread
    pub worker_name: String,

    /// Number of transitions retained in the engine history
    pub history_capacity: usize,

    /// Tag passed to the log sink with every entry
    pub tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_poll_interval_ms: DEFAULT_IDLE_POLL_INTERVAL_MS,
            worker_name: "fsm-worker".to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_idle_poll_interval(mut self, interval: Duration) -> Self {
        self.idle_poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.idle_poll_interval_ms)
    }

    /// Check values the threaded engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.idle_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.worker_name.trim().is_empty() {
            return Err(ConfigError::EmptyWorkerName);
        }
        Ok(())
    }

    /// Defaults overridden by `STATECRAFT_*` environment variables.
    ///
    /// Recognized: `STATECRAFT_QUEUE_CAPACITY`, `STATECRAFT_IDLE_POLL_MS`,
    /// `STATECRAFT_WORKER_NAME`, `STATECRAFT_HISTORY_CAPACITY`,
    /// `STATECRAFT_LOG_TAG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("STATECRAFT_QUEUE_CAPACITY") {
            config.queue_capacity = parse_number("STATECRAFT_QUEUE_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("STATECRAFT_IDLE_POLL_MS") {
            config.idle_poll_interval_ms = parse_number("STATECRAFT_IDLE_POLL_MS", &value)?;
        }
        if let Some(value) = lookup("STATECRAFT_WORKER_NAME") {
            config.worker_name = value;
        }
        if let Some(value) = lookup("STATECRAFT_HISTORY_CAPACITY") {
            config.history_capacity = parse_number("STATECRAFT_HISTORY_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("STATECRAFT_LOG_TAG") {
            config.tag = value;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
