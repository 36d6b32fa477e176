//! Synchronous engine: definition map, current state and the fire algorithm.

use crate::core::{State, StateHistory, StateTransition, Trigger};
use crate::definition::StateDefinition;
use crate::engine::config::EngineConfig;
use crate::error::FsmError;
use crate::logging::{Level, LogSink, TracingSink};
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// What a single fired trigger did.
#[derive(Clone, Debug, PartialEq)]
pub enum FireOutcome<S> {
    /// Moved from one state to another (possibly the same one)
    Transitioned { from: S, to: S },

    /// An internal rule ran; the state is unchanged
    Internal,

    /// No rule in the current state handles the trigger
    Unhandled,

    /// The current state has no definition
    InvalidState,
}

impl<S> FireOutcome<S> {
    /// Whether the trigger had any effect. This is what `fire` returns.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Transitioned { .. } | Self::Internal)
    }
}

/// Finite state machine driven from the calling thread.
///
/// States are declared with [`configure`](Self::configure); triggers are
/// applied with [`fire`](Self::fire) / [`fire_with`](Self::fire_with), which
/// run guards and hooks to completion before returning.
///
/// # Example
///
/// ```rust
/// use statecraft::engine::Engine;
/// use statecraft::{state_enum, trigger_enum};
///
/// state_enum! {
///     enum Light { Off, On }
/// }
///
/// trigger_enum! {
///     enum Switch { Flip, Tap }
/// }
///
/// let mut engine: Engine<Light, Switch> = Engine::new(Light::Off);
/// engine.configure(Light::Off).permit(Switch::Flip, Light::On);
/// engine.configure(Light::On).permit(Switch::Flip, Light::Off);
///
/// assert!(engine.fire(Switch::Flip).unwrap());
/// assert_eq!(engine.current_state(), &Light::On);
///
/// // Nothing handles `Tap`: not an error, just `false`.
/// assert!(!engine.fire(Switch::Tap).unwrap());
/// assert_eq!(engine.current_state(), &Light::On);
/// ```
pub struct Engine<S, T, P = ()> {
    id: Uuid,
    definitions: HashMap<S, StateDefinition<S, T, P>>,
    current: S,
    history: StateHistory<S>,
    logger: Arc<dyn LogSink>,
    config: EngineConfig,
}

impl<S: State, T: Trigger, P: 'static> Engine<S, T, P> {
    /// Create an engine in `initial`, logging through `tracing`.
    pub fn new(initial: S) -> Self {
        Self::with_config(initial, Arc::new(TracingSink), EngineConfig::default())
    }

    /// Create an engine in `initial` with an injected log sink.
    pub fn with_logger(initial: S, logger: Arc<dyn LogSink>) -> Self {
        Self::with_config(initial, logger, EngineConfig::default())
    }

    pub fn with_config(initial: S, logger: Arc<dyn LogSink>, config: EngineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            definitions: HashMap::new(),
            current: initial,
            history: StateHistory::with_capacity(config.history_capacity),
            logger,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_state(&self) -> &S {
        &self.current
    }

    /// Whether the current state is final.
    pub fn is_final(&self) -> bool {
        self.current.is_final()
    }

    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn logger(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.logger)
    }

    pub fn set_logger(&mut self, logger: Arc<dyn LogSink>) {
        self.logger = logger;
    }

    /// Start a fresh definition for `state` and return it for chaining.
    ///
    /// Any earlier definition of the same state is discarded: rules and
    /// hooks are replaced, never merged.
    pub fn configure(&mut self, state: S) -> &mut StateDefinition<S, T, P> {
        let replaced = self.definitions.contains_key(&state);
        self.log(
            Level::DEBUG,
            format_args!(
                "FSM configured: {}{}",
                state.name(),
                if replaced { " (replacing previous definition)" } else { "" }
            ),
        );

        match self.definitions.entry(state) {
            Entry::Occupied(mut entry) => {
                let definition = StateDefinition::configure(entry.key().clone());
                entry.insert(definition);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                let definition = StateDefinition::configure(entry.key().clone());
                entry.insert(definition)
            }
        }
    }

    /// Install a definition built elsewhere, replacing any for the same state.
    pub fn add_definition(&mut self, definition: StateDefinition<S, T, P>) {
        self.log(
            Level::DEBUG,
            format_args!("FSM definition added: {}", definition.state().name()),
        );
        self.definitions.insert(definition.state().clone(), definition);
    }

    pub fn definition(&self, state: &S) -> Option<&StateDefinition<S, T, P>> {
        self.definitions.get(state)
    }

    pub fn is_configured(&self, state: &S) -> bool {
        self.definitions.contains_key(state)
    }

    /// Configured states, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.definitions.keys()
    }

    /// Fire `trigger` without a payload.
    ///
    /// Returns `Ok(true)` when a transition or internal rule ran and
    /// `Ok(false)` when nothing handled the trigger. Hook and action failures
    /// are returned as errors.
    pub fn fire(&mut self, trigger: T) -> Result<bool, FsmError> {
        self.process(trigger, None).map(|outcome| outcome.is_handled())
    }

    /// Fire `trigger` with a payload handed to hooks and internal actions.
    pub fn fire_with(&mut self, trigger: T, payload: P) -> Result<bool, FsmError> {
        self.process(trigger, Some(payload))
            .map(|outcome| outcome.is_handled())
    }

    /// Apply one trigger and report exactly what happened.
    ///
    /// Order of evaluation:
    /// 1. current state without a definition: [`FireOutcome::InvalidState`]
    /// 2. first applicable transition to a configured target: exit hooks,
    ///    state change, entry hooks
    /// 3. first applicable internal rule
    /// 4. otherwise [`FireOutcome::Unhandled`]
    ///
    /// An exit hook failure leaves the state unchanged. An entry hook failure
    /// is reported after the state has already moved.
    pub fn process(
        &mut self,
        trigger: T,
        payload: Option<P>,
    ) -> Result<FireOutcome<S>, FsmError> {
        self.log(
            Level::DEBUG,
            format_args!(
                "Trigger fired: state {}, trigger {}",
                self.current.name(),
                trigger.name()
            ),
        );

        let Some(definition) = self.definitions.get(&self.current) else {
            self.log(
                Level::ERROR,
                format_args!("Invalid current state {}", self.current.name()),
            );
            return Ok(FireOutcome::InvalidState);
        };

        match definition.resolve_transition(&trigger) {
            Some(target) if self.definitions.contains_key(target) => {
                let target = target.clone();
                definition.run_exit(&trigger, payload.as_ref())?;
                return self.enter(target, &trigger, payload.as_ref());
            }
            Some(target) => {
                self.log(
                    Level::DEBUG,
                    format_args!(
                        "Next state does not exist, current state {}, trigger {}, next state {}",
                        self.current.name(),
                        trigger.name(),
                        target.name()
                    ),
                );
            }
            None => {
                self.log(
                    Level::DEBUG,
                    format_args!(
                        "No transition found, current state {}, trigger {}",
                        self.current.name(),
                        trigger.name()
                    ),
                );
            }
        }

        if definition.try_internal_transition(&trigger, payload.as_ref())? {
            self.log(
                Level::DEBUG,
                format_args!(
                    "Internal transition completed: state {}, trigger {}",
                    self.current.name(),
                    trigger.name()
                ),
            );
            return Ok(FireOutcome::Internal);
        }

        self.log(
            Level::DEBUG,
            format_args!(
                "Unhandled trigger {} in state {}",
                trigger.name(),
                self.current.name()
            ),
        );
        Ok(FireOutcome::Unhandled)
    }

    fn enter(
        &mut self,
        target: S,
        trigger: &T,
        payload: Option<&P>,
    ) -> Result<FireOutcome<S>, FsmError> {
        let from = std::mem::replace(&mut self.current, target.clone());
        self.history.record(StateTransition {
            from: from.clone(),
            to: target.clone(),
            trigger: trigger.name().to_string(),
            timestamp: Utc::now(),
        });

        if let Some(definition) = self.definitions.get(&self.current) {
            definition.run_entry(trigger, payload)?;
        }

        self.log(
            Level::DEBUG,
            format_args!(
                "Transitioned from {} to {} on {}",
                from.name(),
                target.name(),
                trigger.name()
            ),
        );
        if target.is_final() {
            self.log(
                Level::INFO,
                format_args!("Reached final state {}", target.name()),
            );
        }

        Ok(FireOutcome::Transitioned { from, to: target })
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.logger.log(level, &self.config.tag, &message.to_string());
    }
}

impl<S: fmt::Debug, T, P> fmt::Debug for Engine<S, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("states", &self.definitions.len())
            .finish_non_exhaustive()
    }
}
