//! Per-state rule table and hooks.

use crate::core::{Guard, State, Trigger};
use crate::definition::rule::{Action, InternalTransitionRule, TransitionRule};
use crate::error::{ActionError, FsmError};
use std::fmt;

/// Everything the engine knows about one state.
///
/// Rules and hooks are kept in registration order and scanned in that order.
/// Builder methods take `&mut self` so a definition obtained from
/// [`Engine::configure`](crate::engine::Engine::configure) can be chained.
///
/// # Example
///
/// ```rust
/// use statecraft::definition::StateDefinition;
/// use statecraft::{state_enum, trigger_enum};
///
/// state_enum! {
///     enum Door { Open, Closed }
/// }
///
/// trigger_enum! {
///     enum Push { Close, Knock }
/// }
///
/// let mut definition: StateDefinition<Door, Push> = StateDefinition::configure(Door::Open);
/// definition
///     .permit(Push::Close, Door::Closed)
///     .permit_internal(Push::Knock, |_, _| Ok(()));
///
/// assert_eq!(definition.resolve_transition(&Push::Close), Some(&Door::Closed));
/// assert_eq!(definition.resolve_transition(&Push::Knock), None);
/// assert!(definition.try_internal_transition(&Push::Knock, None).unwrap());
/// ```
pub struct StateDefinition<S, T, P = ()> {
    state: S,
    transitions: Vec<TransitionRule<S, T>>,
    internal: Vec<InternalTransitionRule<T, P>>,
    on_entry: Vec<Action<T, P>>,
    on_exit: Vec<Action<T, P>>,
}

impl<S: State, T: Trigger, P: 'static> StateDefinition<S, T, P> {
    /// Create an empty definition bound to `state`.
    pub fn configure(state: S) -> Self {
        Self {
            state,
            transitions: Vec::new(),
            internal: Vec::new(),
            on_entry: Vec::new(),
            on_exit: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Move to `target` on `trigger`.
    pub fn permit(&mut self, trigger: T, target: S) -> &mut Self {
        self.transitions
            .push(TransitionRule::new(trigger, target, Guard::always()));
        self
    }

    /// Move to `target` on `trigger` when `guard` returns true at fire time.
    pub fn permit_if<G>(&mut self, trigger: T, target: S, guard: G) -> &mut Self
    where
        G: Fn() -> bool + Send + 'static,
    {
        self.transitions
            .push(TransitionRule::new(trigger, target, Guard::new(guard)));
        self
    }

    /// Run `action` on `trigger` without changing state.
    pub fn permit_internal<F>(&mut self, trigger: T, action: F) -> &mut Self
    where
        F: Fn(Option<&P>, &T) -> Result<(), ActionError> + Send + 'static,
    {
        self.internal.push(InternalTransitionRule::new(
            trigger,
            Box::new(action),
            Guard::always(),
        ));
        self
    }

    /// Run `action` on `trigger` without changing state, when `guard` passes.
    pub fn permit_internal_if<F, G>(&mut self, trigger: T, action: F, guard: G) -> &mut Self
    where
        F: Fn(Option<&P>, &T) -> Result<(), ActionError> + Send + 'static,
        G: Fn() -> bool + Send + 'static,
    {
        self.internal.push(InternalTransitionRule::new(
            trigger,
            Box::new(action),
            Guard::new(guard),
        ));
        self
    }

    /// Add a hook run each time the machine enters this state.
    pub fn on_entry<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(Option<&P>, &T) -> Result<(), ActionError> + Send + 'static,
    {
        self.on_entry.push(Box::new(action));
        self
    }

    /// Add a hook run each time the machine leaves this state.
    pub fn on_exit<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(Option<&P>, &T) -> Result<(), ActionError> + Send + 'static,
    {
        self.on_exit.push(Box::new(action));
        self
    }

    /// Target of the first transition rule whose trigger matches and whose
    /// guard passes.
    pub fn resolve_transition(&self, trigger: &T) -> Option<&S> {
        self.transitions
            .iter()
            .find(|rule| rule.applies(trigger))
            .map(TransitionRule::target)
    }

    /// Execute the first internal rule whose trigger matches and whose guard
    /// passes. Returns `Ok(false)` when none applies.
    pub fn try_internal_transition(
        &self,
        trigger: &T,
        payload: Option<&P>,
    ) -> Result<bool, FsmError> {
        let Some(rule) = self.internal.iter().find(|rule| rule.applies(trigger)) else {
            return Ok(false);
        };

        rule.execute(payload, trigger)
            .map_err(|source| FsmError::InternalAction {
                state: self.state.name().to_string(),
                trigger: trigger.name().to_string(),
                source,
            })?;
        Ok(true)
    }

    /// Run entry hooks in order, stopping at the first failure.
    pub fn run_entry(&self, trigger: &T, payload: Option<&P>) -> Result<(), FsmError> {
        for hook in &self.on_entry {
            hook(payload, trigger).map_err(|source| FsmError::EntryHook {
                state: self.state.name().to_string(),
                trigger: trigger.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Run exit hooks in order, stopping at the first failure.
    pub fn run_exit(&self, trigger: &T, payload: Option<&P>) -> Result<(), FsmError> {
        for hook in &self.on_exit {
            hook(payload, trigger).map_err(|source| FsmError::ExitHook {
                state: self.state.name().to_string(),
                trigger: trigger.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    pub fn entry_hook_count(&self) -> usize {
        self.on_entry.len()
    }

    pub fn exit_hook_count(&self) -> usize {
        self.on_exit.len()
    }

    /// Triggers that have a rule in this state, in registration order,
    /// transitions first. Guards are not evaluated.
    pub fn permitted_triggers(&self) -> Vec<&T> {
        let mut triggers: Vec<&T> = Vec::new();
        let rules = self
            .transitions
            .iter()
            .map(TransitionRule::trigger)
            .chain(self.internal.iter().map(InternalTransitionRule::trigger));
        for trigger in rules {
            if !triggers.contains(&trigger) {
                triggers.push(trigger);
            }
        }
        triggers
    }
}

impl<S: fmt::Debug, T: fmt::Debug, P> fmt::Debug for StateDefinition<S, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("state", &self.state)
            .field("transitions", &self.transitions)
            .field("internal", &self.internal)
            .field("on_entry", &self.on_entry.len())
            .field("on_exit", &self.on_exit.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum Phase {
        Idle,
        Active,
        Paused,
    }

    impl State for Phase {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Active => "Active",
                Self::Paused => "Paused",
            }
        }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum Cmd {
        Start,
        Pause,
        Ping,
    }

    impl Trigger for Cmd {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Pause => "Pause",
                Self::Ping => "Ping",
            }
        }
    }

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        label: &'static str,
    ) -> impl Fn(Option<&()>, &Cmd) -> Result<(), ActionError> + Send + 'static {
        let log = Arc::clone(log);
        move |_, trigger| {
            log.lock().push(format!("{label}:{}", trigger.name()));
            Ok(())
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Idle);
        definition
            .permit(Cmd::Start, Phase::Active)
            .permit(Cmd::Start, Phase::Paused);

        assert_eq!(definition.resolve_transition(&Cmd::Start), Some(&Phase::Active));
    }

    #[test]
    fn failing_guard_falls_through_to_next_rule() {
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Idle);
        definition
            .permit_if(Cmd::Start, Phase::Active, || false)
            .permit(Cmd::Start, Phase::Paused);

        assert_eq!(definition.resolve_transition(&Cmd::Start), Some(&Phase::Paused));
    }

    #[test]
    fn unknown_trigger_resolves_to_nothing() {
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Idle);
        definition.permit(Cmd::Start, Phase::Active);

        assert_eq!(definition.resolve_transition(&Cmd::Pause), None);
        assert!(!definition.try_internal_transition(&Cmd::Pause, None).unwrap());
    }

    #[test]
    fn internal_guard_blocks_action() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition.permit_internal_if(
            Cmd::Ping,
            move |_, _| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            || false,
        );

        assert!(!definition.try_internal_transition(&Cmd::Ping, None).unwrap());
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn only_first_internal_rule_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition
            .permit_internal(Cmd::Ping, recorder(&log, "first"))
            .permit_internal(Cmd::Ping, recorder(&log, "second"));

        assert!(definition.try_internal_transition(&Cmd::Ping, None).unwrap());
        assert_eq!(*log.lock(), vec!["first:Ping".to_string()]);
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition
            .on_entry(recorder(&log, "entry1"))
            .on_entry(recorder(&log, "entry2"))
            .on_exit(recorder(&log, "exit1"))
            .on_exit(recorder(&log, "exit2"));

        definition.run_entry(&Cmd::Start, None).unwrap();
        definition.run_exit(&Cmd::Pause, None).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["entry1:Start", "entry2:Start", "exit1:Pause", "exit2:Pause"]
        );
    }

    #[test]
    fn failing_hook_stops_remaining_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition
            .on_exit(|_, _| Err("disk full".into()))
            .on_exit(recorder(&log, "after"));

        let err = definition.run_exit(&Cmd::Pause, None).unwrap_err();
        assert!(matches!(
            err,
            FsmError::ExitHook { ref state, ref trigger, .. } if state == "Active" && trigger == "Pause"
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn internal_action_error_is_wrapped() {
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition.permit_internal(Cmd::Ping, |_, _| Err("timeout".into()));

        let err = definition.try_internal_transition(&Cmd::Ping, None).unwrap_err();
        assert!(matches!(err, FsmError::InternalAction { .. }));
    }

    #[test]
    fn counts_and_permitted_triggers() {
        let mut definition: StateDefinition<Phase, Cmd> = StateDefinition::configure(Phase::Active);
        definition
            .permit(Cmd::Pause, Phase::Paused)
            .permit_if(Cmd::Pause, Phase::Idle, || true)
            .permit_internal(Cmd::Ping, |_, _| Ok(()))
            .on_entry(|_, _| Ok(()));

        assert_eq!(definition.state(), &Phase::Active);
        assert_eq!(definition.transition_count(), 2);
        assert_eq!(definition.internal_count(), 1);
        assert_eq!(definition.entry_hook_count(), 1);
        assert_eq!(definition.exit_hook_count(), 0);
        assert_eq!(definition.permitted_triggers(), vec![&Cmd::Pause, &Cmd::Ping]);
    }

    #[test]
    fn hooks_receive_payload() {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let mut definition: StateDefinition<Phase, Cmd, String> =
            StateDefinition::configure(Phase::Active);
        definition.on_entry(move |payload: Option<&String>, _| {
            *slot.lock() = payload.cloned();
            Ok(())
        });

        definition
            .run_entry(&Cmd::Start, Some(&"B".to_string()))
            .unwrap();
        assert_eq!(seen.lock().as_deref(), Some("B"));
    }
}
