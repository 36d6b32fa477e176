//! Core identifier traits and supporting types.
//!
//! This module contains the pieces every machine is built from:
//! - State and trigger identifiers via the `State` and `Trigger` traits
//! - Guard predicates for rule control
//! - Bounded history of taken transitions

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{State, Trigger};
