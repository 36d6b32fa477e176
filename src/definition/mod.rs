//! Machine definitions: per-state rules and hooks.
//!
//! A [`StateDefinition`] is built once per `configure` call and then only read
//! by the engine. Rules come in two kinds:
//! - [`TransitionRule`] moves the machine to another state
//! - [`InternalTransitionRule`] runs a side effect and stays put

mod rule;
mod state;

pub use rule::{Action, InternalTransitionRule, TransitionRule};
pub use state::StateDefinition;
