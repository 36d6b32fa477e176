//! Diagnostic sinks.
//!
//! The engine reports everything it does through a [`LogSink`] injected at
//! construction. [`TracingSink`] is the default and forwards to `tracing`, so
//! where the output ends up is decided by the application's subscriber
//! (see [`init_tracing`]).

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use tracing::Level;

/// Leveled, tagged diagnostic sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, tag: &str, message: &str);
}

/// Sink that emits `tracing` events with the tag as a structured field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, tag: &str, message: &str) {
        match level {
            Level::ERROR => tracing::error!(tag, "{message}"),
            Level::WARN => tracing::warn!(tag, "{message}"),
            Level::INFO => tracing::info!(tag, "{message}"),
            Level::DEBUG => tracing::debug!(tag, "{message}"),
            _ => tracing::trace!(tag, "{message}"),
        }
    }
}

/// One entry captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub tag: String,
    pub message: String,
}

/// Sink that keeps every entry in memory.
///
/// Cloning shares the underlying buffer, so a test can hand one clone to the
/// engine and inspect another.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Entries logged at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Whether any entry at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, tag: &str, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a console `tracing` subscriber for applications and demos.
///
/// `RUST_LOG` takes precedence over `default_directive`. Calling this more
/// than once, or after another subscriber was installed, is a no-op.
pub fn init_tracing(default_directive: &str) {
    TRACING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}
