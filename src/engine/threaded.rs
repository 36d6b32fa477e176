//! Single-writer threaded engine.
//!
//! [`ThreadSafeEngine`] moves a configured [`Engine`] onto a dedicated worker
//! thread and feeds it through a bounded crossbeam channel:
//!
//! ```text
//! producer ─┐
//! producer ─┼─ bounded queue (FIFO) ──→ worker ──→ Engine::process
//! producer ─┘                             │
//!                                         └──→ state snapshot / stats
//! ```
//!
//! Only the worker touches the engine, so transition logic needs no locks.
//! Producers block only while the queue is full. Shutdown is a sentinel sent
//! through the same queue, so every trigger accepted before it is applied.

use crate::core::{State, Trigger};
use crate::engine::config::EngineConfig;
use crate::engine::machine::{Engine, FireOutcome};
use crate::error::FsmError;
use crate::logging::{Level, LogSink};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A trigger waiting in the queue, with its optional payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent<T, P> {
    pub trigger: T,
    pub payload: Option<P>,
}

impl<T, P> TriggerEvent<T, P> {
    pub fn new(trigger: T, payload: Option<P>) -> Self {
        Self { trigger, payload }
    }
}

enum Command<T, P> {
    Fire(TriggerEvent<T, P>),
    Shutdown,
}

/// Counters maintained by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Events taken off the queue
    pub received: u64,
    /// Events that moved the machine
    pub transitioned: u64,
    /// Events handled by an internal rule
    pub internal: u64,
    /// Events nothing handled, including those fired in an unconfigured state
    pub unhandled: u64,
    /// Events whose guard, hook or action failed or panicked
    pub failed: u64,
}

#[derive(Default)]
struct StatsCells {
    received: AtomicU64,
    transitioned: AtomicU64,
    internal: AtomicU64,
    unhandled: AtomicU64,
    failed: AtomicU64,
}

impl StatsCells {
    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            received: self.received.load(Ordering::Acquire),
            transitioned: self.transitioned.load(Ordering::Acquire),
            internal: self.internal.load(Ordering::Acquire),
            unhandled: self.unhandled.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

/// State owned by the worker thread.
struct Worker<S, T, P> {
    engine: Engine<S, T, P>,
    receiver: Receiver<Command<T, P>>,
    snapshot: Arc<RwLock<S>>,
    stats: Arc<StatsCells>,
    logger: Arc<dyn LogSink>,
    tag: String,
    idle_poll_interval: Duration,
}

impl<S: State, T: Trigger, P: Send + 'static> Worker<S, T, P> {
    fn run(mut self) -> Engine<S, T, P> {
        self.log(Level::DEBUG, "Worker started, waiting on trigger events");

        loop {
            match self.receiver.recv_timeout(self.idle_poll_interval) {
                Ok(Command::Fire(event)) => self.apply(event),
                Ok(Command::Shutdown) => {
                    self.log(Level::DEBUG, "Worker received shutdown signal");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.log(Level::TRACE, "Worker idle, no trigger events queued");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.log(Level::DEBUG, "Trigger queue disconnected");
                    break;
                }
            }
        }

        let discarded = self
            .receiver
            .try_iter()
            .filter(|command| matches!(command, Command::Fire(_)))
            .count();
        if discarded > 0 {
            self.log(
                Level::WARN,
                &format!("Discarded {discarded} trigger events queued after shutdown"),
            );
        }

        self.log(Level::DEBUG, "Exiting worker loop");
        self.engine
    }

    fn apply(&mut self, event: TriggerEvent<T, P>) {
        self.stats.received.fetch_add(1, Ordering::AcqRel);
        let trigger_name = event.trigger.name().to_string();

        let engine = &mut self.engine;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.process(event.trigger, event.payload)
        }));

        let counter = match result {
            Ok(Ok(FireOutcome::Transitioned { .. })) => &self.stats.transitioned,
            Ok(Ok(FireOutcome::Internal)) => &self.stats.internal,
            Ok(Ok(FireOutcome::Unhandled | FireOutcome::InvalidState)) => &self.stats.unhandled,
            Ok(Err(err)) => {
                self.log(
                    Level::ERROR,
                    &format!("Error on handling incoming trigger {trigger_name}: {err}"),
                );
                &self.stats.failed
            }
            Err(payload) => {
                self.log(
                    Level::ERROR,
                    &format!(
                        "Panic on handling incoming trigger {trigger_name}: {}",
                        panic_message(&*payload)
                    ),
                );
                &self.stats.failed
            }
        };

        // Entry hook failures leave the engine in the new state, so publish
        // whatever the engine holds regardless of outcome.
        *self.snapshot.write() = self.engine.current_state().clone();
        counter.fetch_add(1, Ordering::AcqRel);
    }

    fn log(&self, level: Level, message: &str) {
        self.logger.log(level, &self.tag, message);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Engine whose triggers may be fired from any number of threads.
///
/// `fire` only enqueues: `Ok(true)` means the trigger was accepted, not that
/// it was applied. [`current_state`](Self::current_state) may therefore lag
/// behind triggers still in the queue. Callers that need confirmation should
/// use [`Engine`] directly or call [`shutdown`](Self::shutdown), which drains
/// the queue.
///
/// # Example
///
/// ```rust
/// use statecraft::engine::{Engine, ThreadSafeEngine};
/// use statecraft::{state_enum, trigger_enum};
///
/// state_enum! {
///     enum Light { Off, On }
/// }
///
/// trigger_enum! {
///     enum Switch { Flip }
/// }
///
/// let mut engine: Engine<Light, Switch> = Engine::new(Light::Off);
/// engine.configure(Light::Off).permit(Switch::Flip, Light::On);
/// engine.configure(Light::On).permit(Switch::Flip, Light::Off);
///
/// let threaded = ThreadSafeEngine::spawn(engine).unwrap();
/// for _ in 0..3 {
///     assert!(threaded.fire(Switch::Flip).unwrap());
/// }
///
/// let engine = threaded.shutdown().unwrap().unwrap();
/// assert_eq!(engine.current_state(), &Light::On);
/// assert!(threaded.fire(Switch::Flip).is_err());
/// ```
pub struct ThreadSafeEngine<S, T, P = ()> {
    sender: Sender<Command<T, P>>,
    closed: AtomicBool,
    snapshot: Arc<RwLock<S>>,
    stats: Arc<StatsCells>,
    worker: Mutex<Option<JoinHandle<Engine<S, T, P>>>>,
    logger: Arc<dyn LogSink>,
    tag: String,
    capacity: usize,
}

impl<S: State, T: Trigger, P: Send + 'static> ThreadSafeEngine<S, T, P> {
    /// Start the worker using the engine's own configuration.
    pub fn spawn(engine: Engine<S, T, P>) -> Result<Self, FsmError> {
        let config = engine.config().clone();
        Self::spawn_with(engine, config)
    }

    /// Start the worker with queue and thread settings from `config`.
    pub fn spawn_with(engine: Engine<S, T, P>, config: EngineConfig) -> Result<Self, FsmError> {
        config.validate()?;

        let (sender, receiver) = channel::bounded(config.queue_capacity);
        let snapshot = Arc::new(RwLock::new(engine.current_state().clone()));
        let stats = Arc::new(StatsCells::default());
        let logger = engine.logger();

        let worker = Worker {
            engine,
            receiver,
            snapshot: Arc::clone(&snapshot),
            stats: Arc::clone(&stats),
            logger: Arc::clone(&logger),
            tag: config.tag.clone(),
            idle_poll_interval: config.idle_poll_interval(),
        };

        let handle = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || worker.run())
            .map_err(FsmError::Spawn)?;

        logger.log(
            Level::DEBUG,
            &config.tag,
            &format!(
                "Worker '{}' spawned with queue capacity {}",
                config.worker_name, config.queue_capacity
            ),
        );

        Ok(Self {
            sender,
            closed: AtomicBool::new(false),
            snapshot,
            stats,
            worker: Mutex::new(Some(handle)),
            logger,
            tag: config.tag,
            capacity: config.queue_capacity,
        })
    }

    /// Queue `trigger`, blocking while the queue is full.
    pub fn fire(&self, trigger: T) -> Result<bool, FsmError> {
        self.enqueue(TriggerEvent::new(trigger, None))
    }

    /// Queue `trigger` with a payload, blocking while the queue is full.
    pub fn fire_with(&self, trigger: T, payload: P) -> Result<bool, FsmError> {
        self.enqueue(TriggerEvent::new(trigger, Some(payload)))
    }

    /// Queue `trigger` without blocking.
    pub fn try_fire(&self, trigger: T) -> Result<bool, FsmError> {
        self.try_enqueue(TriggerEvent::new(trigger, None))
    }

    /// Queue `trigger` with a payload without blocking.
    pub fn try_fire_with(&self, trigger: T, payload: P) -> Result<bool, FsmError> {
        self.try_enqueue(TriggerEvent::new(trigger, Some(payload)))
    }

    /// Queue a prepared event, blocking while the queue is full.
    pub fn enqueue(&self, event: TriggerEvent<T, P>) -> Result<bool, FsmError> {
        if self.is_closed() {
            return Err(FsmError::Closed);
        }
        self.sender
            .send(Command::Fire(event))
            .map_err(|_| FsmError::Closed)?;
        Ok(true)
    }

    fn try_enqueue(&self, event: TriggerEvent<T, P>) -> Result<bool, FsmError> {
        if self.is_closed() {
            return Err(FsmError::Closed);
        }
        match self.sender.try_send(Command::Fire(event)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Err(FsmError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(FsmError::Closed),
        }
    }

    /// Last state published by the worker.
    pub fn current_state(&self) -> S {
        self.snapshot.read().clone()
    }

    /// Triggers accepted but not yet taken by the worker.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting triggers, apply everything already queued, stop the
    /// worker and hand back the engine.
    ///
    /// Returns `Ok(None)` if the engine was already shut down. Blocks while
    /// the queue is full, like any producer.
    pub fn shutdown(&self) -> Result<Option<Engine<S, T, P>>, FsmError> {
        self.closed.store(true, Ordering::Release);

        let Some(handle) = self.worker.lock().take() else {
            return Ok(None);
        };

        self.logger
            .log(Level::DEBUG, &self.tag, "Shutting down trigger worker");
        // A send error means the worker is already gone; join reports why.
        let _ = self.sender.send(Command::Shutdown);

        match handle.join() {
            Ok(engine) => Ok(Some(engine)),
            Err(payload) => Err(FsmError::WorkerPanicked(panic_message(&*payload))),
        }
    }
}

impl<S, T, P> Drop for ThreadSafeEngine<S, T, P> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        if let Some(handle) = self.worker.get_mut().take() {
            let _ = self.sender.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}
