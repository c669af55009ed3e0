//! Declarative transition descriptions for the builder.

use crate::core::{Callback, CallbackResult, Event, Guard, StateId, TransitionKind};

/// A transition waiting to be registered by
/// [`MachineBuilder`](crate::builder::MachineBuilder).
///
/// Unlike [`StateMachine::add_transition`], which silently returns `None`,
/// the builder reports unknown states and events as errors.
///
/// [`StateMachine::add_transition`]: crate::machine::StateMachine::add_transition
pub struct TransitionSpec<D> {
    pub(crate) event: Event,
    pub(crate) kind: TransitionKind,
    pub(crate) guard: Option<Guard<D>>,
    pub(crate) action: Option<Callback<D>>,
}

impl<D> TransitionSpec<D> {
    /// Exit `from` and enter `to` on `event`.
    pub fn normal(from: impl Into<StateId>, to: impl Into<StateId>, event: impl Into<Event>) -> Self {
        Self::of(
            TransitionKind::Normal {
                from: from.into(),
                to: to.into(),
            },
            event.into(),
        )
    }

    /// Exit and re-enter `state` on `event`.
    pub fn self_loop(state: impl Into<StateId>, event: impl Into<Event>) -> Self {
        Self::of(
            TransitionKind::SelfLoop {
                state: state.into(),
            },
            event.into(),
        )
    }

    /// Run only the guard and action on `event` while in `state`.
    pub fn null(state: impl Into<StateId>, event: impl Into<Event>) -> Self {
        Self::of(
            TransitionKind::Null {
                state: state.into(),
            },
            event.into(),
        )
    }

    fn of(kind: TransitionKind, event: Event) -> Self {
        Self {
            event,
            kind,
            guard: None,
            action: None,
        }
    }

    /// Add a guard predicate (optional).
    pub fn guard(mut self, guard: Guard<D>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Set the action run before exit and entry (optional).
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: FnMut(&D) -> CallbackResult + Send + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub fn event(&self) -> &Event {
        &self.event
    }
}
