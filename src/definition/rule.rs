//! Transition and internal-transition rules.

use crate::core::{Guard, State, Trigger};
use crate::error::ActionError;
use std::fmt;

/// Side effect run by hooks and internal transitions.
///
/// Receives the payload the trigger was fired with (if any) and the trigger
/// itself.
pub type Action<T, P> = Box<dyn Fn(Option<&P>, &T) -> Result<(), ActionError> + Send>;

/// Moves the machine to `target` when `trigger` fires and the guard passes.
pub struct TransitionRule<S, T> {
    trigger: T,
    target: S,
    guard: Guard,
}

impl<S: State, T: Trigger> TransitionRule<S, T> {
    pub fn new(trigger: T, target: S, guard: Guard) -> Self {
        Self {
            trigger,
            target,
            guard,
        }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    /// Trigger equality first; the guard is only evaluated on a match.
    pub fn applies(&self, trigger: &T) -> bool {
        self.trigger == *trigger && self.guard.check()
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for TransitionRule<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("trigger", &self.trigger)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Runs `action` without leaving the state when `trigger` fires and the
/// guard passes.
pub struct InternalTransitionRule<T, P> {
    trigger: T,
    action: Action<T, P>,
    guard: Guard,
}

impl<T: Trigger, P> InternalTransitionRule<T, P> {
    pub fn new(trigger: T, action: Action<T, P>, guard: Guard) -> Self {
        Self {
            trigger,
            action,
            guard,
        }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn applies(&self, trigger: &T) -> bool {
        self.trigger == *trigger && self.guard.check()
    }

    pub fn execute(&self, payload: Option<&P>, trigger: &T) -> Result<(), ActionError> {
        (self.action)(payload, trigger)
    }
}

impl<T: fmt::Debug, P> fmt::Debug for InternalTransitionRule<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalTransitionRule")
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
