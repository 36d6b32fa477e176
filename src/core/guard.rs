//! Guard predicates for controlling transitions.
//!
//! Guards take no arguments: they read whatever application state their
//! closure captured. The engine evaluates a guard only after the rule's
//! trigger has matched, at fire time.

use std::fmt;

/// Predicate that determines if a rule applies.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Guard;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let muted = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&muted);
/// let not_muted = Guard::new(move || !flag.load(Ordering::SeqCst));
///
/// assert!(not_muted.check());
/// muted.store(true, Ordering::SeqCst);
/// assert!(!not_muted.check());
/// ```
pub struct Guard {
    predicate: Box<dyn Fn() -> bool + Send>,
}

impl Guard {
    /// Create a guard from a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Guard that always allows the rule. Used when no guard is given.
    pub fn always() -> Self {
        Self::new(|| true)
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
