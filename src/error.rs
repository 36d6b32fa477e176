//! Error types for the engine and its configuration.

use thiserror::Error;

/// Error type returned by entry/exit hooks and internal actions.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while firing triggers or running the threaded engine.
///
/// Unhandled triggers and an unconfigured current state are not errors: they
/// make `fire` return `Ok(false)`.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("Exit hook of state '{state}' failed on trigger '{trigger}': {source}")]
    ExitHook {
        state: String,
        trigger: String,
        #[source]
        source: ActionError,
    },

    #[error("Entry hook of state '{state}' failed on trigger '{trigger}': {source}")]
    EntryHook {
        state: String,
        trigger: String,
        #[source]
        source: ActionError,
    },

    #[error("Internal action in state '{state}' failed on trigger '{trigger}': {source}")]
    InternalAction {
        state: String,
        trigger: String,
        #[source]
        source: ActionError,
    },

    #[error("Engine is closed and no longer accepts triggers")]
    Closed,

    #[error("Trigger queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors found when validating an [`EngineConfig`](crate::engine::EngineConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Idle poll interval must be at least 1ms")]
    ZeroPollInterval,

    #[error("Worker name must not be empty")]
    EmptyWorkerName,

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
