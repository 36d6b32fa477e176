//! Statecraft: a typed finite state machine engine
//!
//! Callers declare their own state and trigger identifiers, attach guarded
//! transitions, internal transitions and entry/exit hooks to each state, then
//! drive the machine by firing triggers.
//!
//! # Core Concepts
//!
//! - **State / Trigger**: caller-supplied identifiers via the `State` and
//!   `Trigger` traits (or the `state_enum!` / `trigger_enum!` macros)
//! - **StateDefinition**: per-state ordered rules and hooks
//! - **Engine**: synchronous machine, first matching rule wins
//! - **ThreadSafeEngine**: bounded queue and a single worker thread applying
//!   triggers in FIFO order
//!
//! # Example
//!
//! ```rust
//! use statecraft::{state_enum, trigger_enum, Engine};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! state_enum! {
//!     enum Call { Idle, Connected }
//! }
//!
//! trigger_enum! {
//!     enum Event { Connect, Mute, Hangup }
//! }
//!
//! let muted = Arc::new(AtomicBool::new(false));
//! let (set_muted, read_muted) = (Arc::clone(&muted), Arc::clone(&muted));
//!
//! let mut engine: Engine<Call, Event> = Engine::new(Call::Idle);
//! engine.configure(Call::Idle).permit(Event::Connect, Call::Connected);
//! engine
//!     .configure(Call::Connected)
//!     .permit(Event::Hangup, Call::Idle)
//!     .permit_internal_if(
//!         Event::Mute,
//!         move |_, _| {
//!             set_muted.store(true, Ordering::SeqCst);
//!             Ok(())
//!         },
//!         move || !read_muted.load(Ordering::SeqCst),
//!     );
//!
//! assert!(engine.fire(Event::Connect).unwrap());
//! assert!(engine.fire(Event::Mute).unwrap());
//! assert!(!engine.fire(Event::Mute).unwrap());
//! assert!(muted.load(Ordering::SeqCst));
//! assert!(engine.fire(Event::Hangup).unwrap());
//! assert_eq!(engine.current_state(), &Call::Idle);
//! ```

pub mod core;
pub mod definition;
pub mod engine;
pub mod error;
pub mod logging;
mod macros;

// Re-export commonly used types
pub use crate::core::{Guard, State, StateHistory, StateTransition, Trigger};
pub use definition::StateDefinition;
pub use engine::{Engine, EngineConfig, FireOutcome, ThreadSafeEngine, TriggerEvent};
pub use error::{ActionError, ConfigError, FsmError};
pub use logging::{LogSink, MemorySink, TracingSink};
