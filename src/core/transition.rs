//! Transitions: guarded state changes triggered by one event.

use super::event::Event;
use super::guard::{Callback, CallbackResult, Guard};
use super::state::{State, StateId};
use crate::log::{Level, LogSink};
use crate::machine::MachineError;
use std::fmt;

/// The three side-effect profiles a transition can have.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Exit `from`, then enter `to`.
    Normal { from: StateId, to: StateId },
    /// Exit and re-enter the same state.
    SelfLoop { state: StateId },
    /// Run guard and action only. No exit or entry.
    Null { state: StateId },
}

impl TransitionKind {
    pub fn source(&self) -> &StateId {
        match self {
            Self::Normal { from, .. } => from,
            Self::SelfLoop { state } | Self::Null { state } => state,
        }
    }

    pub fn destination(&self) -> &StateId {
        match self {
            Self::Normal { to, .. } => to,
            Self::SelfLoop { state } | Self::Null { state } => state,
        }
    }
}

/// A registered transition.
///
/// Transitions are created through [`StateMachine::add_transition`] and its
/// siblings, which resolve the source and destination to slots in the
/// owning machine.
///
/// [`StateMachine::add_transition`]: crate::machine::StateMachine::add_transition
pub struct Transition<D> {
    event: Event,
    kind: TransitionKind,
    pub(crate) source: usize,
    pub(crate) destination: usize,
    condition: Option<Guard<D>>,
    action: Option<Callback<D>>,
}

impl<D> Transition<D> {
    pub(crate) fn new(event: Event, kind: TransitionKind, source: usize, destination: usize) -> Self {
        Self {
            event,
            kind,
            source,
            destination,
            condition: None,
            action: None,
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub fn source_state(&self) -> &StateId {
        self.kind.source()
    }

    pub fn destination_state(&self) -> &StateId {
        self.kind.destination()
    }

    /// Set the guard, replacing any previous one.
    pub fn add_condition<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        self.set_condition(Guard::new(predicate))
    }

    pub fn set_condition(&mut self, guard: Guard<D>) -> &mut Self {
        self.condition = Some(guard);
        self
    }

    /// Set the action, replacing any previous one.
    pub fn add_action<F>(&mut self, action: F) -> &mut Self
    where
        F: FnMut(&D) -> CallbackResult + Send + 'static,
    {
        self.set_action(Box::new(action))
    }

    pub fn set_action(&mut self, action: Callback<D>) -> &mut Self {
        self.action = Some(action);
        self
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn matches(&self, current: usize, event: &Event) -> bool {
        self.source == current && self.event == *event
    }

    /// Whether the guard (if any) lets this transition fire for `data`.
    pub fn admits(&self, data: &D) -> bool {
        self.condition.as_ref().is_none_or(|g| g.check(data))
    }

    /// Run the action, then the exit/entry chain for this kind.
    ///
    /// The guard must already have been checked with [`Transition::admits`].
    pub(crate) fn fire(
        &mut self,
        states: &mut [State<D>],
        data: &D,
        log: &dyn LogSink,
    ) -> Result<(), MachineError> {
        log.log(Level::Info, &self.to_string());
        if let Some(action) = self.action.as_mut() {
            action(data).map_err(MachineError::Callback)?;
        }
        match self.kind {
            TransitionKind::Normal { .. } | TransitionKind::SelfLoop { .. } => {
                states[self.source].stop(data)?;
                states[self.destination].start(data)
            }
            TransitionKind::Null { .. } => Ok(()),
        }
    }
}

impl<D> fmt::Display for Transition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TransitionKind::Normal { from, to } => {
                write!(f, "Transition State={from} to State={to} by {}", self.event)
            }
            TransitionKind::SelfLoop { state } => {
                write!(f, "SelfTransition on State={state} by {}", self.event)
            }
            TransitionKind::Null { state } => {
                write!(f, "NullTransition on State={state} by {}", self.event)
            }
        }
    }
}

impl<D> fmt::Debug for Transition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("event", &self.event)
            .field("kind", &self.kind)
            .field("condition", &self.condition.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}
