//! Engines that drive machine definitions.
//!
//! - [`Engine`] applies triggers on the calling thread and returns once every
//!   guard and hook has run.
//! - [`ThreadSafeEngine`] accepts triggers from any thread and applies them in
//!   FIFO order on one dedicated worker.

mod config;
mod machine;
mod threaded;

pub use config::{
    EngineConfig, DEFAULT_IDLE_POLL_INTERVAL_MS, DEFAULT_QUEUE_CAPACITY, DEFAULT_TAG,
};
pub use machine::{Engine, FireOutcome};
pub use threaded::{ThreadSafeEngine, TriggerEvent, WorkerStats};
