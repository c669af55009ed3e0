//! Builder for assembling state machines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionSpec;
use crate::core::{CallbackResult, Event, State, StateId, TransitionKind};
use crate::log::SharedSink;
use crate::machine::{ExitCallback, StateMachine};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// States are registered in the order they are given, transitions in the
/// order they are given. The log sink, if set, is installed before any
/// state is registered.
pub struct MachineBuilder<D> {
    name: String,
    exit_status: Option<Arc<str>>,
    log: Option<SharedSink>,
    initial: Option<StateId>,
    states: Vec<State<D>>,
    events: Vec<Event>,
    transitions: Vec<TransitionSpec<D>>,
    exit_callback: Option<ExitCallback<D>>,
}

impl<D> MachineBuilder<D> {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_status: None,
            log: None,
            initial: None,
            states: Vec::new(),
            events: Vec::new(),
            transitions: Vec::new(),
            exit_callback: None,
        }
    }

    /// Status of the exit sentinel (defaults to `Normal`).
    pub fn exit_status(mut self, status: impl Into<Arc<str>>) -> Self {
        self.exit_status = Some(status.into());
        self
    }

    pub fn log_sink(mut self, sink: SharedSink) -> Self {
        self.log = Some(sink);
        self
    }

    /// Add the initial state (required). A second call adds the state but
    /// keeps the first as initial.
    pub fn initial(mut self, state: State<D>) -> Self {
        if self.initial.is_none() {
            self.initial = Some(state.id().clone());
        }
        self.states.push(state);
        self
    }

    pub fn state(mut self, state: State<D>) -> Self {
        self.states.push(state);
        self
    }

    pub fn event(mut self, event: impl Into<Event>) -> Self {
        self.events.push(event.into());
        self
    }

    /// Add multiple events at once.
    pub fn events<I, E>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Event>,
    {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    pub fn transition(mut self, spec: TransitionSpec<D>) -> Self {
        self.transitions.push(spec);
        self
    }

    /// Set the machine's exit callback.
    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&State<D>, &D) -> CallbackResult + Send + 'static,
    {
        self.exit_callback = Some(Box::new(callback));
        self
    }

    /// Build the state machine.
    /// Returns an error if the initial state is missing, a state name is
    /// repeated, or a transition refers to something never added.
    pub fn build(self) -> Result<StateMachine<D>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let mut machine = match self.exit_status {
            Some(status) => StateMachine::with_exit_status(self.name, status),
            None => StateMachine::new(self.name),
        };
        if let Some(sink) = self.log {
            machine.set_log_sink(sink);
        }

        let mut initial_pending = true;
        for state in self.states {
            let is_initial = initial_pending && *state.id() == initial;
            machine.add_state(state, is_initial)?;
            initial_pending &= !is_initial;
        }
        for event in self.events {
            machine.add_event(event);
        }

        for spec in self.transitions {
            for id in [spec.kind.source(), spec.kind.destination()] {
                if !machine.has_state(id) {
                    return Err(BuildError::UnknownState {
                        state: id.to_string(),
                    });
                }
            }
            if !machine.has_event(&spec.event) {
                return Err(BuildError::UnknownEvent {
                    event: spec.event.name().to_string(),
                });
            }

            let TransitionSpec {
                event,
                kind,
                guard,
                action,
            } = spec;
            let registered = match &kind {
                TransitionKind::Normal { from, to } => machine.add_transition(from, to, &event),
                TransitionKind::SelfLoop { state } => machine.add_self_transition(state, &event),
                TransitionKind::Null { state } => machine.add_null_transition(state, &event),
            };
            if let Some(transition) = registered {
                if let Some(guard) = guard {
                    transition.set_condition(guard);
                }
                if let Some(action) = action {
                    transition.set_action(action);
                }
            }
        }

        if let Some(callback) = self.exit_callback {
            machine.set_exit_callback(callback);
        }
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::MachineError;

    fn door() -> MachineBuilder<()> {
        MachineBuilder::new("door")
            .initial(State::new("Closed"))
            .state(State::new("Open"))
            .events(["push", "pull"])
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = MachineBuilder::<()>::new("m").state(State::new("A")).build();
        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn fluent_api_builds_machine() {
        let mut machine = door()
            .transition(TransitionSpec::normal("Closed", "Open", "push"))
            .transition(TransitionSpec::normal("Open", "Closed", "pull"))
            .build()
            .unwrap();

        assert_eq!(machine.name(), "door");
        assert_eq!(machine.initial_state().unwrap().name(), "Closed");
        assert_eq!(machine.transitions().len(), 2);

        machine.start(&()).unwrap();
        machine.trigger_event(&Event::new("push"), &(), false).unwrap();
        assert_eq!(machine.current_state().unwrap().name(), "Open");
    }

    #[test]
    fn unknown_state_is_reported() {
        let result = door()
            .transition(TransitionSpec::normal("Closed", "Locked", "push"))
            .build();
        assert!(matches!(result, Err(BuildError::UnknownState { ref state }) if state == "Locked"));
    }

    #[test]
    fn unknown_event_is_reported() {
        let result = door()
            .transition(TransitionSpec::self_loop("Closed", "knock"))
            .build();
        assert!(matches!(result, Err(BuildError::UnknownEvent { ref event }) if event == "knock"));
    }

    #[test]
    fn duplicate_state_surfaces_machine_error() {
        let result = door().state(State::new("Open")).build();
        assert!(matches!(
            result,
            Err(BuildError::Machine(MachineError::DuplicateState { .. }))
        ));
    }

    #[test]
    fn exit_status_names_the_sentinel() {
        let machine = door().exit_status("Done").build().unwrap();
        assert_eq!(machine.exit_state().name(), "DoneExitState");
    }

    #[test]
    fn guard_and_action_are_attached() {
        let machine = MachineBuilder::<u8>::new("m")
            .initial(State::new("A"))
            .event("ping")
            .transition(
                TransitionSpec::null("A", "ping")
                    .when(|n: &u8| *n > 0)
                    .action(|_: &u8| Ok(())),
            )
            .build()
            .unwrap();

        let transition = &machine.transitions()[0];
        assert!(transition.has_condition());
        assert!(transition.has_action());
    }
}
