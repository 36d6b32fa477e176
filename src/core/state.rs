//! Identifier traits for states and triggers.
//!
//! The engine never inspects identifiers beyond equality and hashing. Both
//! traits only add a display name so diagnostics stay readable.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// States are keys into the engine's definition map, so they must be
/// hashable. A [`ThreadSafeEngine`](crate::engine::ThreadSafeEngine) moves
/// them into its worker and shares the current one with producers, hence
/// `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use statecraft::core::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum DoorState {
///     Open,
///     Closed,
///     Removed,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Removed => "Removed",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Removed)
///     }
/// }
///
/// assert_eq!(DoorState::Open.name(), "Open");
/// assert!(DoorState::Removed.is_final());
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// The engine does not refuse triggers in a final state; it only reports
    /// it through [`Engine::is_final`](crate::engine::Engine::is_final) and the
    /// logs.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Trait for trigger identifiers.
///
/// Triggers are compared against each rule's trigger in registration order,
/// so only equality is required.
pub trait Trigger: Clone + PartialEq + Debug + Send + 'static {
    /// Get the trigger's name for display/logging.
    fn name(&self) -> &str;
}
