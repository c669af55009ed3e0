//! State machine registry and event dispatch.

use crate::core::{CallbackResult, Event, State, StateId, Transition, TransitionKind};
use crate::log::{null_sink, Level, SharedSink};
use crate::machine::error::MachineError;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Slot of the exit sentinel; it is registered first by every constructor.
const EXIT_SLOT: usize = 0;

static NEXT_MACHINE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a machine instance.
///
/// Unlike names, two machines never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineId(u64);

impl MachineId {
    fn next() -> Self {
        MachineId(NEXT_MACHINE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Callback run when a triggered transition lands on an exit state.
pub type ExitCallback<D> = Box<dyn FnMut(&State<D>, &D) -> CallbackResult + Send>;

/// What a call to [`StateMachine::trigger_event`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A transition fired and the machine moved from `from` to `to`.
    Fired { from: StateId, to: StateId },

    /// A matching transition was found but its guard rejected the payload.
    Blocked { from: StateId, to: StateId },

    /// The event was forwarded to the current state's child machine.
    Propagated(Box<TriggerOutcome>),

    /// No transition matched the current state and event.
    Unhandled,
}

impl TriggerOutcome {
    /// Whether a transition fired, here or in a nested machine.
    pub fn fired(&self) -> bool {
        match self {
            TriggerOutcome::Fired { .. } => true,
            TriggerOutcome::Propagated(inner) => inner.fired(),
            _ => false,
        }
    }
}

/// A hierarchical state machine.
///
/// The machine owns its states in registration order; transitions refer to
/// them by slot. Dispatch is synchronous: `start`, `stop`, and
/// `trigger_event` run every callback inline and return when done.
///
/// The machine does no locking. Share it across threads only behind a lock.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{Event, State};
/// use hfsm::machine::StateMachine;
///
/// let mut machine: StateMachine<()> = StateMachine::new("door");
/// let closed = machine.add_state(State::new("Closed"), true).unwrap();
/// let open = machine.add_state(State::new("Open"), false).unwrap();
/// let push = Event::new("push");
/// machine.add_event(push.clone());
/// machine.add_transition(&closed, &open, &push);
///
/// machine.start(&()).unwrap();
/// machine.trigger_event(&push, &(), false).unwrap();
/// assert_eq!(machine.current_state().unwrap().name(), "Open");
/// ```
pub struct StateMachine<D> {
    id: MachineId,
    name: String,
    states: Vec<State<D>>,
    index: HashMap<StateId, usize>,
    events: Vec<Event>,
    transitions: Vec<Transition<D>>,
    initial: Option<usize>,
    current: Option<usize>,
    exit_callback: Option<ExitCallback<D>>,
    exited: bool,
    log: SharedSink,
}

impl<D> StateMachine<D> {
    /// Create a machine with a `NormalExitState` sentinel.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_exit_status(name, crate::core::DEFAULT_EXIT_STATUS)
    }

    /// Create a machine whose sentinel is named `status + "ExitState"`.
    pub fn with_exit_status(name: impl Into<String>, status: impl Into<Arc<str>>) -> Self {
        let id = MachineId::next();
        let mut exit = State::exit(status);
        exit.set_parent_sm(id)
            .expect("a fresh exit state has no child machine");
        let mut index = HashMap::new();
        index.insert(exit.id().clone(), EXIT_SLOT);

        Self {
            id,
            name: name.into(),
            states: vec![exit],
            index,
            events: Vec::new(),
            transitions: Vec::new(),
            initial: None,
            current: None,
            exit_callback: None,
            exited: true,
            log: null_sink(),
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install a log sink on this machine and every state registered so far.
    ///
    /// Child machines keep their own sink.
    pub fn set_log_sink(&mut self, sink: SharedSink) {
        for state in &mut self.states {
            state.set_log_sink(Arc::clone(&sink));
        }
        self.log = sink;
    }

    /// Register a state.
    ///
    /// The first state added with `initial` set becomes the initial state;
    /// later requests are ignored.
    pub fn add_state(&mut self, mut state: State<D>, initial: bool) -> Result<StateId, MachineError> {
        if self.index.contains_key(state.id()) {
            return Err(MachineError::DuplicateState {
                machine: self.name.clone(),
                state: state.name().to_string(),
            });
        }
        state.set_parent_sm(self.id)?;
        state.set_log_sink(Arc::clone(&self.log));

        let slot = self.states.len();
        let id = state.id().clone();
        self.index.insert(id.clone(), slot);
        self.states.push(state);

        if initial && self.initial.is_none() {
            self.initial = Some(slot);
        }
        Ok(id)
    }

    /// Register an event. Duplicates are tolerated.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn has_state(&self, id: &StateId) -> bool {
        self.index.contains_key(id)
    }

    pub fn has_event(&self, event: &Event) -> bool {
        self.events.contains(event)
    }

    /// Register a transition from `src` to `dst` on `event`.
    ///
    /// Returns `None` without registering anything if either state or the
    /// event is unknown to this machine.
    pub fn add_transition(
        &mut self,
        src: &StateId,
        dst: &StateId,
        event: &Event,
    ) -> Option<&mut Transition<D>> {
        let kind = TransitionKind::Normal {
            from: src.clone(),
            to: dst.clone(),
        };
        self.register(kind, event)
    }

    /// Register a transition that exits and re-enters `state`.
    pub fn add_self_transition(&mut self, state: &StateId, event: &Event) -> Option<&mut Transition<D>> {
        let kind = TransitionKind::SelfLoop {
            state: state.clone(),
        };
        self.register(kind, event)
    }

    /// Register a transition that runs only its guard and action.
    pub fn add_null_transition(&mut self, state: &StateId, event: &Event) -> Option<&mut Transition<D>> {
        let kind = TransitionKind::Null {
            state: state.clone(),
        };
        self.register(kind, event)
    }

    fn register(&mut self, kind: TransitionKind, event: &Event) -> Option<&mut Transition<D>> {
        let source = *self.index.get(kind.source())?;
        let destination = *self.index.get(kind.destination())?;
        if !self.has_event(event) {
            return None;
        }
        self.transitions
            .push(Transition::new(event.clone(), kind, source, destination));
        self.transitions.last_mut()
    }

    /// Set the callback run when a triggered transition reaches an exit
    /// state. It fires at most once per start cycle.
    pub fn on_exit<F>(&mut self, callback: F)
    where
        F: FnMut(&State<D>, &D) -> CallbackResult + Send + 'static,
    {
        self.exit_callback = Some(Box::new(callback));
    }

    pub(crate) fn set_exit_callback(&mut self, callback: ExitCallback<D>) {
        self.exit_callback = Some(callback);
    }

    /// Enter the initial state.
    pub fn start(&mut self, data: &D) -> Result<(), MachineError> {
        let initial = self.initial.ok_or_else(|| MachineError::NoInitialState {
            machine: self.name.clone(),
        })?;
        self.current = Some(initial);
        self.exited = false;
        self.states[initial].start(data)
    }

    /// Exit the current state and park on the exit sentinel.
    ///
    /// Does not run the exit callback.
    pub fn stop(&mut self, data: &D) -> Result<(), MachineError> {
        let current = self.current_slot()?;
        self.states[current].stop(data)?;
        self.current = Some(EXIT_SLOT);
        self.exited = true;
        Ok(())
    }

    /// True between `start` and reaching this machine's exit sentinel.
    pub fn is_running(&self) -> bool {
        self.current.is_some_and(|slot| slot != EXIT_SLOT)
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// Dispatch `event` with `data`.
    ///
    /// With `propagate` set and a current state that owns a child machine,
    /// the call is forwarded to the child and this machine's transitions are
    /// not consulted. Otherwise the earliest-registered transition matching
    /// the current state and event is taken. An unmatched event is logged as
    /// a warning and leaves the machine untouched.
    pub fn trigger_event(
        &mut self,
        event: &Event,
        data: &D,
        propagate: bool,
    ) -> Result<TriggerOutcome, MachineError> {
        let current = self.current_slot()?;

        if propagate {
            if let Some(child) = self.states[current].child_sm_mut() {
                self.log.log(
                    Level::Debug,
                    &format!("Propagating evt {} from {} to {}", event, self.name, child.name()),
                );
                let outcome = child.trigger_event(event, data, propagate)?;
                return Ok(TriggerOutcome::Propagated(Box::new(outcome)));
            }
        }

        let Some(position) = self
            .transitions
            .iter()
            .position(|t| t.matches(current, event))
        else {
            self.log.log(
                Level::Warning,
                &format!(
                    "Event {} is not valid in state {}",
                    event, self.states[current]
                ),
            );
            return Ok(TriggerOutcome::Unhandled);
        };

        let Self {
            states,
            transitions,
            current: current_slot,
            exit_callback,
            exited,
            log,
            ..
        } = self;
        let transition = &mut transitions[position];
        let from = states[current].id().clone();
        let to = states[transition.destination].id().clone();

        if !transition.admits(data) {
            log.log(
                Level::Debug,
                &format!("Guard rejected {} in state {}", event, from),
            );
            return Ok(TriggerOutcome::Blocked { from, to });
        }

        *current_slot = Some(transition.destination);
        transition.fire(states, data, &**log)?;

        let landed = &states[transition.destination];
        if landed.is_exit() && !*exited {
            if let Some(callback) = exit_callback.as_mut() {
                *exited = true;
                callback(landed, data).map_err(MachineError::Callback)?;
            }
        }

        Ok(TriggerOutcome::Fired { from, to })
    }

    fn current_slot(&self) -> Result<usize, MachineError> {
        if self.initial.is_none() {
            return Err(MachineError::NoInitialState {
                machine: self.name.clone(),
            });
        }
        self.current.ok_or_else(|| MachineError::NotStarted {
            machine: self.name.clone(),
        })
    }

    pub fn current_state(&self) -> Option<&State<D>> {
        self.current.map(|slot| &self.states[slot])
    }

    pub fn initial_state(&self) -> Option<&State<D>> {
        self.initial.map(|slot| &self.states[slot])
    }

    pub fn exit_state(&self) -> &State<D> {
        &self.states[EXIT_SLOT]
    }

    pub fn state(&self, id: &StateId) -> Option<&State<D>> {
        self.index.get(id).map(|&slot| &self.states[slot])
    }

    /// Mutable access to a registered state, e.g. to reach its child machine.
    pub fn state_mut(&mut self, id: &StateId) -> Option<&mut State<D>> {
        let slot = *self.index.get(id)?;
        self.states.get_mut(slot)
    }

    /// Registered states in registration order, sentinel first.
    pub fn states(&self) -> impl Iterator<Item = &State<D>> {
        self.states.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn transitions(&self) -> &[Transition<D>] {
        &self.transitions
    }
}

impl<D> PartialEq for StateMachine<D> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<D> fmt::Display for StateMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<D> fmt::Debug for StateMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("states", &self.states)
            .field("events", &self.events)
            .field("transitions", &self.transitions)
            .field("current", &self.current_state().map(State::name))
            .field("exited", &self.exited)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn idle_running() -> (StateMachine<u32>, StateId, StateId, Event) {
        let mut machine = StateMachine::new("worker");
        let idle = machine.add_state(State::new("Idle"), true).unwrap();
        let running = machine.add_state(State::new("Running"), false).unwrap();
        let go = Event::new("go");
        machine.add_event(go.clone());
        machine.add_transition(&idle, &running, &go).unwrap();
        (machine, idle, running, go)
    }

    #[test]
    fn new_machine_registers_exit_sentinel() {
        let machine: StateMachine<()> = StateMachine::new("m");
        assert_eq!(machine.exit_state().name(), "NormalExitState");
        assert_eq!(machine.exit_state().parent_sm(), Some(machine.id()));
        assert_eq!(machine.states().count(), 1);
        assert!(machine.current_state().is_none());
        assert!(machine.is_exited());

        let custom: StateMachine<()> = StateMachine::with_exit_status("m", "Abort");
        assert_eq!(custom.exit_state().name(), "AbortExitState");
    }

    #[test]
    fn first_initial_state_wins() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        machine.add_state(State::new("A"), true).unwrap();
        machine.add_state(State::new("B"), true).unwrap();
        assert_eq!(machine.initial_state().unwrap().name(), "A");
    }

    #[test]
    fn add_state_sets_parent() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        let a = machine.add_state(State::new("A"), false).unwrap();
        assert_eq!(machine.state(&a).unwrap().parent_sm(), Some(machine.id()));
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        machine.add_state(State::new("A"), false).unwrap();
        let err = machine.add_state(State::new("A"), false).unwrap_err();
        assert!(matches!(err, MachineError::DuplicateState { ref state, .. } if state == "A"));

        let err = machine
            .add_state(State::new("NormalExitState"), false)
            .unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn add_transition_requires_registered_parts() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        let a = machine.add_state(State::new("A"), true).unwrap();
        let ghost = StateId::from("Ghost");
        let go = Event::new("go");

        assert!(machine.add_transition(&a, &a, &go).is_none());
        machine.add_event(go.clone());
        assert!(machine.add_transition(&a, &ghost, &go).is_none());
        assert!(machine.add_self_transition(&ghost, &go).is_none());
        assert!(machine.add_null_transition(&a, &Event::new("other")).is_none());
        assert!(machine.transitions().is_empty());

        assert!(machine.add_self_transition(&a, &go).is_some());
        assert_eq!(machine.transitions().len(), 1);
    }

    #[test]
    fn duplicate_events_are_tolerated() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        machine.add_event(Event::new("go"));
        machine.add_event(Event::new("go"));
        assert_eq!(machine.events().len(), 2);
        assert!(machine.has_event(&Event::new("go")));
    }

    #[test]
    fn operations_before_start_fail() {
        let mut empty: StateMachine<()> = StateMachine::new("empty");
        assert!(matches!(
            empty.start(&()),
            Err(MachineError::NoInitialState { .. })
        ));
        assert!(matches!(
            empty.stop(&()),
            Err(MachineError::NoInitialState { .. })
        ));

        let (mut machine, _, _, go) = idle_running();
        assert!(matches!(
            machine.trigger_event(&go, &0, false),
            Err(MachineError::NotStarted { .. })
        ));
        assert!(matches!(
            machine.stop(&0),
            Err(MachineError::NotStarted { .. })
        ));
    }

    #[test]
    fn trigger_moves_to_destination() {
        let (mut machine, _, _, go) = idle_running();
        machine.start(&0).unwrap();

        let outcome = machine.trigger_event(&go, &0, false).unwrap();

        assert_eq!(
            outcome,
            TriggerOutcome::Fired {
                from: "Idle".into(),
                to: "Running".into()
            }
        );
        assert_eq!(machine.current_state().unwrap().name(), "Running");
        assert!(machine.is_running());
    }

    #[test]
    fn unmatched_event_is_logged_and_ignored() {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&warnings);
        let (mut machine, _, _, _) = idle_running();
        machine.set_log_sink(Arc::new(move |level: Level, msg: &str| {
            if level == Level::Warning {
                captured.lock().unwrap().push(msg.to_string());
            }
        }));
        machine.start(&0).unwrap();

        let outcome = machine.trigger_event(&Event::new("bogus"), &0, false).unwrap();

        assert_eq!(outcome, TriggerOutcome::Unhandled);
        assert_eq!(machine.current_state().unwrap().name(), "Idle");
        assert_eq!(
            *warnings.lock().unwrap(),
            vec!["Event Event=bogus is not valid in state State=Idle"]
        );
    }

    #[test]
    fn rejected_guard_leaves_state_unchanged() {
        let (mut machine, idle, running, _) = idle_running();
        let hop = Event::new("hop");
        machine.add_event(hop.clone());
        machine
            .add_transition(&idle, &running, &hop)
            .unwrap()
            .add_condition(|n: &u32| *n > 5);
        machine.start(&0).unwrap();

        let outcome = machine.trigger_event(&hop, &1, false).unwrap();
        assert!(matches!(outcome, TriggerOutcome::Blocked { .. }));
        assert_eq!(machine.current_state().unwrap().name(), "Idle");

        let outcome = machine.trigger_event(&hop, &9, false).unwrap();
        assert!(outcome.fired());
        assert_eq!(machine.current_state().unwrap().name(), "Running");
    }

    #[test]
    fn stop_parks_on_sentinel_without_exit_callback() {
        let (mut machine, _, _, _) = idle_running();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        machine.on_exit(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        machine.start(&0).unwrap();
        machine.stop(&0).unwrap();

        assert!(!machine.is_running());
        assert!(machine.is_exited());
        assert_eq!(machine.current_state().unwrap().name(), "NormalExitState");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exit_callback_receives_the_exit_state() {
        let (mut machine, _, running, _) = idle_running();
        let done = Event::new("done");
        machine.add_event(done.clone());
        let exit = machine.exit_state().id().clone();
        machine.add_transition(&running, &exit, &done).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        machine.on_exit(move |state, data| {
            *slot.lock().unwrap() = Some((state.name().to_string(), *data));
            Ok(())
        });

        machine.start(&0).unwrap();
        machine.trigger_event(&Event::new("go"), &0, false).unwrap();
        machine.trigger_event(&done, &42, false).unwrap();

        assert!(!machine.is_running());
        assert!(machine.is_exited());
        assert_eq!(
            *seen.lock().unwrap(),
            Some(("NormalExitState".to_string(), 42))
        );
    }

    #[test]
    fn failing_entry_leaves_machine_in_destination() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        let a = machine.add_state(State::new("A"), true).unwrap();
        let mut broken: State<()> = State::new("B");
        broken.on_entry(|_| Err("cannot enter".into()));
        let b = machine.add_state(broken, false).unwrap();
        let go = Event::new("go");
        machine.add_event(go.clone());
        machine.add_transition(&a, &b, &go).unwrap();
        machine.start(&()).unwrap();

        let err = machine.trigger_event(&go, &(), false).unwrap_err();

        assert_eq!(err.to_string(), "cannot enter");
        assert_eq!(machine.current_state().unwrap().name(), "B");
    }

    #[test]
    fn machine_equality_is_by_name_identity_is_by_id() {
        let a: StateMachine<()> = StateMachine::new("same");
        let b: StateMachine<()> = StateMachine::new("same");
        assert!(a == b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.to_string(), "same");
    }

    #[test]
    fn machine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StateMachine<u32>>();
    }
}
